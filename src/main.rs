use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use rustls::crypto::{ring, CryptoProvider};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use facelink::config::ConfigStore;
use facelink::session::SessionController;
use facelink::telemetry::{JsonlSink, PointSink, TraceSink};

/// Log level for the application
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

/// facelink command line arguments
#[derive(Parser, Debug)]
#[command(name = "facelink")]
#[command(version, about = "WebRTC client for remote face-landmark inference", long_about = None)]
struct CliArgs {
    /// Offer endpoint URL (overrides config)
    #[arg(short = 'u', long, value_name = "URL")]
    offer_url: Option<String>,

    /// Codec to restrict the offer to, e.g. "H264/90000";
    /// "default" sends the offer unfiltered (overrides config)
    #[arg(long, value_name = "CODEC")]
    codec: Option<String>,

    /// Server-side video transform hint (overrides config)
    #[arg(long, value_name = "NAME")]
    video_transform: Option<String>,

    /// Write projected landmark points to stdout as JSON lines
    #[arg(long)]
    jsonl: bool,

    /// Configuration file path (default: facelink.json)
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short = 'l', long, value_name = "LEVEL", default_value = "info")]
    log_level: LogLevel,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    init_logging(args.log_level, args.verbose);

    // Install default crypto provider (required by rustls 0.23+)
    CryptoProvider::install_default(ring::default_provider())
        .expect("Failed to install rustls crypto provider");

    tracing::info!("Starting facelink v{}", env!("CARGO_PKG_VERSION"));

    let config_path = args.config.unwrap_or_else(get_config_path);
    tracing::info!("Configuration file: {}", config_path.display());

    let config_store = ConfigStore::new(&config_path).await?;
    let mut config = (*config_store.get()).clone();

    // CLI arguments take precedence over the config file
    if let Some(url) = args.offer_url {
        config.server.offer_url = url;
    }
    if let Some(transform) = args.video_transform {
        config.server.video_transform = transform;
    }
    if let Some(codec) = args.codec {
        config.webrtc.codec_filter = match codec.as_str() {
            "default" => None,
            _ => Some(codec),
        };
    }
    if args.jsonl {
        config.output.emit_jsonl = true;
    }

    let sink: Box<dyn PointSink> = if config.output.emit_jsonl {
        Box::new(JsonlSink::stdout())
    } else {
        Box::new(TraceSink)
    };

    let controller = SessionController::new(Arc::new(config), sink).await?;

    let cancel = CancellationToken::new();
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
            ctrl_c_cancel.cancel();
        }
    });

    let stats = controller.run(cancel).await?;
    tracing::info!(
        "Session finished: {} frames, {} points, {} decode errors",
        stats.frames,
        stats.points,
        stats.decode_errors
    );

    Ok(())
}

fn init_logging(level: LogLevel, verbose_count: u8) {
    // Verbose count overrides log level
    let effective_level = match verbose_count {
        0 => level,
        1 => LogLevel::Debug,
        _ => LogLevel::Trace,
    };

    // Build filter string based on effective level
    let filter = match effective_level {
        LogLevel::Error => "facelink=error,webrtc=error",
        LogLevel::Warn => "facelink=warn,webrtc=error",
        LogLevel::Info => "facelink=info,webrtc=error",
        LogLevel::Debug => "facelink=debug,webrtc=warn",
        LogLevel::Trace => "facelink=trace,webrtc=info",
    };

    // Environment variable takes highest priority
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into());

    if let Err(err) = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
    {
        eprintln!("failed to initialize tracing: {}", err);
    }
}

/// Get the configuration file path
fn get_config_path() -> PathBuf {
    // Check environment variable first
    if let Ok(path) = std::env::var("FACELINK_CONFIG") {
        return PathBuf::from(path);
    }

    PathBuf::from("facelink.json")
}
