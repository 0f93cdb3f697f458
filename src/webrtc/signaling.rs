//! Signaling types and the offer/answer exchange
//!
//! The exchange is a single JSON POST against the inference server's offer
//! endpoint; the response body is the answer. Anything else (transport
//! failure, non-success status, unparsable body) is a negotiation error.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::negotiation::NegotiationError;

/// Session description type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdpType {
    Offer,
    Answer,
}

impl std::fmt::Display for SdpType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SdpType::Offer => write!(f, "offer"),
            SdpType::Answer => write!(f, "answer"),
        }
    }
}

/// A session description paired with its type, as handed to and produced
/// by the peer transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSdp {
    pub sdp_type: SdpType,
    pub sdp: String,
}

/// Offer sent to the inference server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferRequest {
    /// SDP content
    pub sdp: String,
    /// Description type
    #[serde(rename = "type")]
    pub sdp_type: SdpType,
    /// Server-side processing hint, forwarded untouched
    pub video_transform: String,
}

/// Answer returned by the inference server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerResponse {
    /// SDP content
    pub sdp: String,
    /// Description type
    #[serde(rename = "type")]
    pub sdp_type: SdpType,
}

/// Peer connection state, mirrored from the transport's callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::New => write!(f, "new"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Connected => write!(f, "connected"),
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Failed => write!(f, "failed"),
            ConnectionState::Closed => write!(f, "closed"),
        }
    }
}

/// Candidate-gathering state, mirrored from the transport's callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatheringState {
    New,
    Gathering,
    Complete,
}

impl std::fmt::Display for GatheringState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GatheringState::New => write!(f, "new"),
            GatheringState::Gathering => write!(f, "gathering"),
            GatheringState::Complete => write!(f, "complete"),
        }
    }
}

/// One offer/answer round trip with the signaling endpoint.
#[async_trait]
pub trait SignalingExchange: Send + Sync {
    async fn exchange(&self, offer: OfferRequest) -> Result<AnswerResponse, NegotiationError>;
}

/// HTTP signaling client posting the offer as JSON.
pub struct HttpSignaling {
    client: reqwest::Client,
    offer_url: String,
}

impl HttpSignaling {
    pub fn new(offer_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            offer_url: offer_url.into(),
        }
    }
}

#[async_trait]
impl SignalingExchange for HttpSignaling {
    async fn exchange(&self, offer: OfferRequest) -> Result<AnswerResponse, NegotiationError> {
        debug!("posting {} ({} bytes) to {}", offer.sdp_type, offer.sdp.len(), self.offer_url);

        let response = self
            .client
            .post(&self.offer_url)
            .json(&offer)
            .send()
            .await
            .map_err(|e| NegotiationError::Exchange(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NegotiationError::Exchange(format!(
                "signaling server returned {status}"
            )));
        }

        response
            .json::<AnswerResponse>()
            .await
            .map_err(|e| NegotiationError::MalformedAnswer(e.to_string()))
    }
}
