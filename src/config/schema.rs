//! Application configuration schema

use serde::{Deserialize, Serialize};

// Re-export WebRtcConfig from the webrtc module
pub use crate::webrtc::WebRtcConfig;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Signaling server settings
    pub server: ServerConfig,
    /// Display surface / capture hint settings
    pub video: VideoConfig,
    /// WebRTC settings
    pub webrtc: WebRtcConfig,
    /// Telemetry output settings
    pub output: OutputConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            video: VideoConfig::default(),
            webrtc: WebRtcConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

/// Signaling server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Offer endpoint of the inference server
    pub offer_url: String,
    /// Server-side processing hint, forwarded opaquely with the offer
    pub video_transform: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            offer_url: "http://127.0.0.1:8080/offer".to_string(),
            video_transform: "none".to_string(),
        }
    }
}

/// Display surface configuration. Telemetry points are normalized; these
/// dimensions give them pixel coordinates. Also the capture hint for the
/// embedder's video source.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct VideoConfig {
    /// Surface width in pixels
    pub width: u32,
    /// Surface height in pixels
    pub height: u32,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
        }
    }
}

/// Telemetry output configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OutputConfig {
    /// Write projected points to stdout as JSON lines
    pub emit_jsonl: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { emit_jsonl: false }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_self_contained() {
        let config = AppConfig::default();
        assert_eq!(config.server.offer_url, "http://127.0.0.1:8080/offer");
        assert_eq!(config.server.video_transform, "none");
        assert_eq!(config.video.width, 640);
        assert_eq!(config.video.height, 480);
        assert!(!config.output.emit_jsonl);
    }

    #[test]
    fn partial_documents_deserialize_with_defaults() {
        let config: AppConfig = serde_json::from_str(
            r#"{"server": {"offer_url": "http://example.com/offer"}, "video": {"width": 1280}}"#,
        )
        .unwrap();
        assert_eq!(config.server.offer_url, "http://example.com/offer");
        assert_eq!(config.server.video_transform, "none");
        assert_eq!(config.video.width, 1280);
        assert_eq!(config.video.height, 480);
    }
}
