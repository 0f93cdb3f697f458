//! Application-wide error type

use thiserror::Error;

use crate::telemetry::TelemetryError;
use crate::webrtc::NegotiationError;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("negotiation failed: {0}")]
    Negotiation(#[from] NegotiationError),

    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),

    #[error("WebRTC error: {0}")]
    WebRtc(String),
}

/// Result type alias for the crate
pub type Result<T> = std::result::Result<T, AppError>;
