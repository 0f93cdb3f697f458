//! Offer/answer negotiation sequencing
//!
//! One [`Negotiator`] drives one session: create the offer, apply it, wait
//! for candidate gathering to finish, filter the offer's video section to
//! the configured codec, exchange it with the signaling endpoint, and apply
//! the answer. Every step that can fail maps to its own
//! [`NegotiationError`] variant, and any failure parks the state machine in
//! [`NegotiationState::Failed`]. The negotiator never retries; that policy
//! belongs to the caller.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use super::peer::PeerTransport;
use super::signaling::{
    ConnectionState, GatheringState, OfferRequest, SdpType, SessionSdp, SignalingExchange,
};
use crate::sdp::filter_codec;

/// Negotiation lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationState {
    Idle,
    OfferCreated,
    GatheringCandidates,
    OfferReady,
    AwaitingAnswer,
    Connected,
    Failed,
}

impl std::fmt::Display for NegotiationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NegotiationState::Idle => write!(f, "idle"),
            NegotiationState::OfferCreated => write!(f, "offer-created"),
            NegotiationState::GatheringCandidates => write!(f, "gathering-candidates"),
            NegotiationState::OfferReady => write!(f, "offer-ready"),
            NegotiationState::AwaitingAnswer => write!(f, "awaiting-answer"),
            NegotiationState::Connected => write!(f, "connected"),
            NegotiationState::Failed => write!(f, "failed"),
        }
    }
}

/// Negotiation failures, one variant per failing step.
#[derive(Debug, Error)]
pub enum NegotiationError {
    #[error("offer creation failed: {0}")]
    CreateOffer(String),

    #[error("applying local description failed: {0}")]
    SetLocalDescription(String),

    #[error("no local description after candidate gathering")]
    MissingLocalDescription,

    #[error("candidate gathering timed out after {0:?}")]
    GatheringTimeout(Duration),

    #[error("transport closed while negotiating")]
    TransportClosed,

    #[error("signaling exchange failed: {0}")]
    Exchange(String),

    #[error("malformed answer from signaling server: {0}")]
    MalformedAnswer(String),

    #[error("applying remote description failed: {0}")]
    SetRemoteDescription(String),

    #[error("a negotiation is already in progress")]
    AlreadyNegotiating,
}

/// Knobs for one negotiation run.
#[derive(Debug, Clone)]
pub struct NegotiationOptions {
    /// Media kind the codec filter applies to.
    pub media_kind: String,
    /// Codec the offer is restricted to; `None` sends it unfiltered.
    pub codec_filter: Option<String>,
    /// Opaque server-side processing hint, forwarded in the offer request.
    pub video_transform: String,
    /// Upper bound on the gathering wait; `None` waits indefinitely.
    pub gathering_timeout: Option<Duration>,
}

impl Default for NegotiationOptions {
    fn default() -> Self {
        Self {
            media_kind: "video".to_string(),
            codec_filter: Some("H264/90000".to_string()),
            video_transform: "none".to_string(),
            gathering_timeout: None,
        }
    }
}

/// Sequences one offer/answer exchange against a peer transport.
pub struct Negotiator {
    transport: Arc<dyn PeerTransport>,
    signaling: Arc<dyn SignalingExchange>,
    options: NegotiationOptions,
    state_tx: watch::Sender<NegotiationState>,
    state_rx: watch::Receiver<NegotiationState>,
    in_flight: Mutex<()>,
}

impl Negotiator {
    pub fn new(
        transport: Arc<dyn PeerTransport>,
        signaling: Arc<dyn SignalingExchange>,
        options: NegotiationOptions,
    ) -> Self {
        let (state_tx, state_rx) = watch::channel(NegotiationState::Idle);
        Self {
            transport,
            signaling,
            options,
            state_tx,
            state_rx,
            in_flight: Mutex::new(()),
        }
    }

    /// Current negotiation state.
    pub fn state(&self) -> NegotiationState {
        *self.state_rx.borrow()
    }

    /// Subscribe to state changes.
    pub fn state_watch(&self) -> watch::Receiver<NegotiationState> {
        self.state_rx.clone()
    }

    fn transition(&self, next: NegotiationState) {
        debug!("negotiation state: {}", next);
        let _ = self.state_tx.send(next);
    }

    /// Run the full offer/answer sequence.
    ///
    /// At most one call may be in flight; a second call while one is
    /// pending returns [`NegotiationError::AlreadyNegotiating`] without
    /// touching the running sequence.
    pub async fn negotiate(&self) -> Result<(), NegotiationError> {
        let _guard = self
            .in_flight
            .try_lock()
            .map_err(|_| NegotiationError::AlreadyNegotiating)?;

        match self.run_sequence().await {
            Ok(()) => {
                self.transition(NegotiationState::Connected);
                info!("negotiation complete");
                Ok(())
            }
            Err(e) => {
                self.transition(NegotiationState::Failed);
                Err(e)
            }
        }
    }

    async fn run_sequence(&self) -> Result<(), NegotiationError> {
        let offer = self.transport.create_offer().await?;
        self.transition(NegotiationState::OfferCreated);

        self.transport.set_local_description(offer).await?;
        self.transition(NegotiationState::GatheringCandidates);

        self.wait_gathering_complete().await?;
        self.transition(NegotiationState::OfferReady);

        // The applied description, not the created offer: candidate
        // gathering has folded the ICE candidates into it by now.
        let local = self
            .transport
            .local_description()
            .await
            .ok_or(NegotiationError::MissingLocalDescription)?;
        let request = self.build_request(local);

        self.transition(NegotiationState::AwaitingAnswer);
        let answer = self.signaling.exchange(request).await?;
        if answer.sdp_type != SdpType::Answer {
            return Err(NegotiationError::MalformedAnswer(format!(
                "expected an answer, got \"{}\"",
                answer.sdp_type
            )));
        }

        self.transport
            .set_remote_description(SessionSdp {
                sdp_type: answer.sdp_type,
                sdp: answer.sdp,
            })
            .await
    }

    fn build_request(&self, local: SessionSdp) -> OfferRequest {
        let sdp = match &self.options.codec_filter {
            Some(codec) => {
                let filtered = filter_codec(&local.sdp, &self.options.media_kind, codec);
                if let Err(e) = filtered.require_codec() {
                    // Soft failure: the offer goes out with a degraded
                    // media section and the server decides what to do.
                    warn!("{e}");
                } else {
                    debug!(
                        "offer restricted to {} ({} payload types)",
                        codec,
                        filtered.allowed.len()
                    );
                }
                filtered.sdp
            }
            None => local.sdp,
        };

        OfferRequest {
            sdp,
            sdp_type: local.sdp_type,
            video_transform: self.options.video_transform.clone(),
        }
    }

    /// One-shot gathering barrier.
    ///
    /// Proceeds immediately when gathering is already complete; otherwise
    /// awaits the first completion on a fresh watch receiver, which is
    /// dropped on return (the listener deregisters after one hit). A
    /// transport close while waiting fails the negotiation, as does the
    /// configured timeout.
    async fn wait_gathering_complete(&self) -> Result<(), NegotiationError> {
        let mut gathering = self.transport.gathering_watch();
        let mut connection = self.transport.connection_watch();

        let wait = async move {
            if *gathering.borrow_and_update() == GatheringState::Complete {
                return Ok(());
            }
            if is_terminal(*connection.borrow_and_update()) {
                return Err(NegotiationError::TransportClosed);
            }

            loop {
                tokio::select! {
                    changed = gathering.changed() => {
                        changed.map_err(|_| NegotiationError::TransportClosed)?;
                        if *gathering.borrow_and_update() == GatheringState::Complete {
                            return Ok(());
                        }
                    }
                    changed = connection.changed() => {
                        changed.map_err(|_| NegotiationError::TransportClosed)?;
                        if is_terminal(*connection.borrow_and_update()) {
                            return Err(NegotiationError::TransportClosed);
                        }
                    }
                }
            }
        };

        match self.options.gathering_timeout {
            Some(limit) => tokio::time::timeout(limit, wait)
                .await
                .map_err(|_| NegotiationError::GatheringTimeout(limit))?,
            None => wait.await,
        }
    }
}

fn is_terminal(state: ConnectionState) -> bool {
    matches!(state, ConnectionState::Failed | ConnectionState::Closed)
}
