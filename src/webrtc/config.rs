//! WebRTC configuration

use serde::{Deserialize, Serialize};

/// WebRTC configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebRtcConfig {
    /// STUN server URLs
    pub stun_servers: Vec<String>,
    /// TURN server configuration
    pub turn_servers: Vec<TurnServer>,
    /// Codec the outgoing offer is restricted to, as the literal
    /// `<name>/<clock>` rtpmap encoding (e.g. `"H264/90000"`).
    /// `None` sends the offer unfiltered.
    pub codec_filter: Option<String>,
    /// Media kind the codec filter applies to
    pub media_kind: String,
    /// Upper bound on the candidate-gathering wait, in milliseconds.
    /// `None` waits indefinitely.
    pub gathering_timeout_ms: Option<u64>,
    /// Telemetry data-channel parameters
    pub channel: ChannelConfig,
}

impl Default for WebRtcConfig {
    fn default() -> Self {
        Self {
            // Empty STUN servers for local connections - host candidates work directly
            // For remote servers, configure STUN/TURN via the config file
            stun_servers: vec![],
            turn_servers: vec![],
            codec_filter: Some("H264/90000".to_string()),
            media_kind: "video".to_string(),
            gathering_timeout_ms: None,
            channel: ChannelConfig::default(),
        }
    }
}

/// TURN server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnServer {
    /// TURN server URLs (e.g., ["turn:turn.example.com:3478?transport=udp"])
    pub urls: Vec<String>,
    /// Username for TURN authentication
    pub username: String,
    /// Credential for TURN authentication
    pub credential: String,
}

/// Telemetry data-channel parameters.
///
/// Forwarded to the transport unmodified. Landmark frames supersede each
/// other, so the defaults trade reliability for latency: unordered, one
/// retransmission, 500 ms packet lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Channel label
    pub label: String,
    /// In-order delivery
    pub ordered: bool,
    /// Maximum number of retransmissions
    pub max_retransmits: Option<u16>,
    /// Maximum packet lifetime in milliseconds
    pub max_packet_life_time: Option<u16>,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            label: "telemetry".to_string(),
            ordered: false,
            max_retransmits: Some(1),
            max_packet_life_time: Some(500),
        }
    }
}
