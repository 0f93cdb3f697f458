//! WebRTC client stack
//!
//! This module drives one peer session against a remote inference server:
//! - Offer/answer negotiation over a plain HTTP signaling exchange
//! - SDP codec filtering of the outgoing offer (see [`crate::sdp`])
//! - A send-only video track (frames are supplied by the embedder)
//! - A data channel carrying landmark telemetry back from the server
//!
//! Architecture:
//! ```text
//! SessionController
//!        |
//!        v
//! Negotiator ---- filter_codec ----> OfferRequest
//!        |                               |
//!        |                        HttpSignaling (POST /offer)
//!        v                               |
//! PeerTransport (RtcPeer) <-- AnswerResponse
//!        |
//!        +-- video track ------> inference server
//!        +-- data channel <----- landmark telemetry
//! ```

pub mod config;
pub mod media;
pub mod negotiation;
pub mod peer;
pub mod signaling;

pub use config::{ChannelConfig, TurnServer, WebRtcConfig};
pub use media::{LocalVideoTrack, VideoSourceConfig};
pub use negotiation::{NegotiationError, NegotiationOptions, NegotiationState, Negotiator};
pub use peer::{PeerTransport, RtcPeer};
pub use signaling::{
    AnswerResponse, ConnectionState, GatheringState, HttpSignaling, OfferRequest, SdpType,
    SessionSdp, SignalingExchange,
};
