//! Session controller
//!
//! Thin glue with no algorithmic content of its own: it owns the peer
//! transport, the outgoing video track and the telemetry loop, and wires
//! the negotiator and decoder together. Frame capture is the embedder's
//! job via [`SessionController::video_track`].

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::error::Result;
use crate::telemetry::{decode_points, Overlay, PointSink, SurfaceSize};
use crate::webrtc::{
    HttpSignaling, LocalVideoTrack, NegotiationOptions, Negotiator, PeerTransport, RtcPeer,
    VideoSourceConfig,
};

/// Counters for one session.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionStats {
    /// Telemetry frames rendered
    pub frames: u64,
    /// Total points across all frames
    pub points: u64,
    /// Messages dropped because they failed to decode
    pub decode_errors: u64,
}

/// Owns the transport and media capabilities for one session.
pub struct SessionController {
    peer: Arc<RtcPeer>,
    track: LocalVideoTrack,
    negotiator: Negotiator,
    telemetry_rx: mpsc::Receiver<Bytes>,
    overlay: Overlay,
    sink: Box<dyn PointSink>,
    stats: SessionStats,
}

impl SessionController {
    /// Build the session: peer connection, video track, telemetry channel.
    /// The data channel is created here, before negotiation, so it is part
    /// of the offered session.
    pub async fn new(config: Arc<AppConfig>, sink: Box<dyn PointSink>) -> Result<Self> {
        let peer = Arc::new(RtcPeer::new(&config.webrtc).await?);
        info!("session {} created", peer.session_id());

        let track = LocalVideoTrack::new(VideoSourceConfig::default());
        peer.add_video_track(&track).await?;

        let telemetry_rx = peer.create_telemetry_channel(&config.webrtc.channel).await?;

        let signaling = Arc::new(HttpSignaling::new(config.server.offer_url.clone()));
        let options = NegotiationOptions {
            media_kind: config.webrtc.media_kind.clone(),
            codec_filter: config.webrtc.codec_filter.clone(),
            video_transform: config.server.video_transform.clone(),
            gathering_timeout: config.webrtc.gathering_timeout_ms.map(Duration::from_millis),
        };
        let transport: Arc<dyn PeerTransport> = peer.clone();
        let negotiator = Negotiator::new(transport, signaling, options);

        let overlay = Overlay::new(SurfaceSize {
            width: config.video.width,
            height: config.video.height,
        });

        Ok(Self {
            peer,
            track,
            negotiator,
            telemetry_rx,
            overlay,
            sink,
            stats: SessionStats::default(),
        })
    }

    /// The outgoing video track, for the embedder's capture source.
    pub fn video_track(&self) -> &LocalVideoTrack {
        &self.track
    }

    /// Negotiate, then pump telemetry until the channel closes or the
    /// token is cancelled. The peer is closed on the way out either way.
    pub async fn run(mut self, cancel: CancellationToken) -> Result<SessionStats> {
        if let Err(e) = self.negotiator.negotiate().await {
            let _ = self.peer.close().await;
            return Err(e.into());
        }

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("session cancelled");
                    break;
                }
                message = self.telemetry_rx.recv() => {
                    match message {
                        Some(payload) => self.handle_message(&payload),
                        None => {
                            info!("telemetry channel closed");
                            break;
                        }
                    }
                }
            }
        }

        self.peer.close().await?;
        debug!(
            "session {} done: {} frames, {} points, {} decode errors",
            self.peer.session_id(),
            self.stats.frames,
            self.stats.points,
            self.stats.decode_errors
        );
        Ok(self.stats)
    }

    fn handle_message(&mut self, payload: &[u8]) {
        match decode_points(payload) {
            Ok(points) => {
                let frame = self.overlay.project(&points);
                self.sink.render(&frame);
                self.stats.frames += 1;
                self.stats.points += points.len() as u64;
            }
            Err(e) => {
                // Corrupt frame: drop it and keep the session alive.
                self.stats.decode_errors += 1;
                warn!("dropping telemetry message: {e}");
            }
        }
    }
}
