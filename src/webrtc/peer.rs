//! Peer transport capability
//!
//! [`PeerTransport`] is the seam the negotiator sequences against: offer
//! creation, local/remote description application, and the two state
//! watches it observes. [`RtcPeer`] is the production implementation over
//! the `webrtc` crate; tests drive the negotiator with a fake.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::api::APIBuilder;
use webrtc::data_channel::data_channel_init::RTCDataChannelInit;
use webrtc::data_channel::data_channel_message::DataChannelMessage;
use webrtc::ice_transport::ice_gatherer_state::RTCIceGathererState;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::sdp_type::RTCSdpType;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::RTCPeerConnection;

use super::config::{ChannelConfig, WebRtcConfig};
use super::media::LocalVideoTrack;
use super::negotiation::NegotiationError;
use super::signaling::{ConnectionState, GatheringState, SdpType, SessionSdp};
use crate::error::{AppError, Result};

/// The transport capability the negotiator sequences against.
///
/// Implementations own the underlying peer-connection object; the
/// negotiator only ever sees descriptions and state watches.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    /// Produce a fresh local offer (not yet applied).
    async fn create_offer(&self) -> std::result::Result<SessionSdp, NegotiationError>;

    /// Apply a local description, which starts candidate gathering.
    async fn set_local_description(
        &self,
        desc: SessionSdp,
    ) -> std::result::Result<(), NegotiationError>;

    /// The currently applied local description, with any gathered
    /// candidates folded in.
    async fn local_description(&self) -> Option<SessionSdp>;

    /// Watch over the candidate-gathering state.
    fn gathering_watch(&self) -> watch::Receiver<GatheringState>;

    /// Watch over the peer-connection state.
    fn connection_watch(&self) -> watch::Receiver<ConnectionState>;

    /// Apply the remote answer.
    async fn set_remote_description(
        &self,
        desc: SessionSdp,
    ) -> std::result::Result<(), NegotiationError>;
}

/// Peer connection wrapper with event handling
pub struct RtcPeer {
    session_id: String,
    pc: Arc<RTCPeerConnection>,
    gathering_rx: watch::Receiver<GatheringState>,
    connection_tx: Arc<watch::Sender<ConnectionState>>,
    connection_rx: watch::Receiver<ConnectionState>,
}

impl RtcPeer {
    /// Create a new peer connection
    pub async fn new(config: &WebRtcConfig) -> Result<Self> {
        let session_id = uuid::Uuid::new_v4().to_string();

        // Create media engine
        let mut media_engine = MediaEngine::default();
        media_engine
            .register_default_codecs()
            .map_err(|e| AppError::WebRtc(format!("failed to register codecs: {e}")))?;

        // Create interceptor registry
        let mut registry = Registry::new();
        registry = register_default_interceptors(registry, &mut media_engine)
            .map_err(|e| AppError::WebRtc(format!("failed to register interceptors: {e}")))?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        // Build ICE servers
        let mut ice_servers = vec![];

        for stun_url in &config.stun_servers {
            ice_servers.push(RTCIceServer {
                urls: vec![stun_url.clone()],
                ..Default::default()
            });
        }

        for turn in &config.turn_servers {
            ice_servers.push(RTCIceServer {
                urls: turn.urls.clone(),
                username: turn.username.clone(),
                credential: turn.credential.clone(),
                ..Default::default()
            });
        }

        let rtc_config = RTCConfiguration {
            ice_servers,
            ..Default::default()
        };

        let pc = api
            .new_peer_connection(rtc_config)
            .await
            .map_err(|e| AppError::WebRtc(format!("failed to create peer connection: {e}")))?;
        let pc = Arc::new(pc);

        let (gathering_tx, gathering_rx) = watch::channel(GatheringState::New);
        let (connection_tx, connection_rx) = watch::channel(ConnectionState::New);
        let connection_tx = Arc::new(connection_tx);

        let peer = Self {
            session_id,
            pc,
            gathering_rx,
            connection_tx,
            connection_rx,
        };
        peer.setup_event_handlers(Arc::new(gathering_tx));

        Ok(peer)
    }

    /// Mirror the transport's callbacks into the state watches.
    fn setup_event_handlers(&self, gathering_tx: Arc<watch::Sender<GatheringState>>) {
        let session_id = self.session_id.clone();
        self.pc
            .on_ice_gathering_state_change(Box::new(move |s: RTCIceGathererState| {
                let gathering_tx = gathering_tx.clone();
                let session_id = session_id.clone();

                Box::pin(async move {
                    let state = match s {
                        RTCIceGathererState::New => GatheringState::New,
                        RTCIceGathererState::Gathering => GatheringState::Gathering,
                        RTCIceGathererState::Complete => GatheringState::Complete,
                        _ => return,
                    };

                    debug!("peer {} gathering state: {}", session_id, state);
                    let _ = gathering_tx.send(state);
                })
            }));

        let connection_tx = self.connection_tx.clone();
        let session_id = self.session_id.clone();
        self.pc
            .on_peer_connection_state_change(Box::new(move |s: RTCPeerConnectionState| {
                let connection_tx = connection_tx.clone();
                let session_id = session_id.clone();

                Box::pin(async move {
                    let state = match s {
                        RTCPeerConnectionState::New => ConnectionState::New,
                        RTCPeerConnectionState::Connecting => ConnectionState::Connecting,
                        RTCPeerConnectionState::Connected => ConnectionState::Connected,
                        RTCPeerConnectionState::Disconnected => ConnectionState::Disconnected,
                        RTCPeerConnectionState::Failed => ConnectionState::Failed,
                        RTCPeerConnectionState::Closed => ConnectionState::Closed,
                        _ => return,
                    };

                    info!("peer {} connection state: {}", session_id, state);
                    let _ = connection_tx.send(state);
                })
            }));
    }

    /// Register the outgoing video track.
    pub async fn add_video_track(&self, track: &LocalVideoTrack) -> Result<()> {
        self.pc
            .add_track(track.rtp_track())
            .await
            .map_err(|e| AppError::WebRtc(format!("failed to add video track: {e}")))?;

        info!("peer {}: video track added", self.session_id);
        Ok(())
    }

    /// Create the telemetry data channel and return the stream of raw
    /// message payloads arriving on it. The channel must exist before the
    /// offer is created so it is part of the negotiated session.
    pub async fn create_telemetry_channel(
        &self,
        config: &ChannelConfig,
    ) -> Result<mpsc::Receiver<Bytes>> {
        let init = RTCDataChannelInit {
            ordered: Some(config.ordered),
            max_retransmits: config.max_retransmits,
            max_packet_life_time: config.max_packet_life_time,
            ..Default::default()
        };

        let dc = self
            .pc
            .create_data_channel(&config.label, Some(init))
            .await
            .map_err(|e| AppError::WebRtc(format!("failed to create data channel: {e}")))?;

        let (tx, rx) = mpsc::channel::<Bytes>(64);

        let label = config.label.clone();
        dc.on_open(Box::new(move || {
            info!("data channel '{}' open", label);
            Box::pin(async {})
        }));

        let label = config.label.clone();
        dc.on_close(Box::new(move || {
            info!("data channel '{}' closed", label);
            Box::pin(async {})
        }));

        dc.on_message(Box::new(move |msg: DataChannelMessage| {
            let tx = tx.clone();
            Box::pin(async move {
                if tx.send(msg.data).await.is_err() {
                    warn!("telemetry receiver dropped; discarding message");
                }
            })
        }));

        info!("peer {}: data channel '{}' created", self.session_id, config.label);
        Ok(rx)
    }

    /// Current connection state.
    pub fn connection_state(&self) -> ConnectionState {
        *self.connection_rx.borrow()
    }

    /// Close the connection
    pub async fn close(&self) -> Result<()> {
        // Unblock anything waiting on the state watches before the
        // transport's own callbacks catch up.
        let _ = self.connection_tx.send(ConnectionState::Closed);

        self.pc
            .close()
            .await
            .map_err(|e| AppError::WebRtc(format!("failed to close peer connection: {e}")))?;

        Ok(())
    }

    /// Get session ID
    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

#[async_trait]
impl PeerTransport for RtcPeer {
    async fn create_offer(&self) -> std::result::Result<SessionSdp, NegotiationError> {
        let offer = self
            .pc
            .create_offer(None)
            .await
            .map_err(|e| NegotiationError::CreateOffer(e.to_string()))?;

        Ok(SessionSdp {
            sdp_type: SdpType::Offer,
            sdp: offer.sdp,
        })
    }

    async fn set_local_description(
        &self,
        desc: SessionSdp,
    ) -> std::result::Result<(), NegotiationError> {
        let desc = to_rtc_description(&desc)
            .map_err(|e| NegotiationError::SetLocalDescription(e.to_string()))?;

        self.pc
            .set_local_description(desc)
            .await
            .map_err(|e| NegotiationError::SetLocalDescription(e.to_string()))
    }

    async fn local_description(&self) -> Option<SessionSdp> {
        self.pc.local_description().await.map(|d| SessionSdp {
            sdp_type: match d.sdp_type {
                RTCSdpType::Answer => SdpType::Answer,
                _ => SdpType::Offer,
            },
            sdp: d.sdp,
        })
    }

    fn gathering_watch(&self) -> watch::Receiver<GatheringState> {
        self.gathering_rx.clone()
    }

    fn connection_watch(&self) -> watch::Receiver<ConnectionState> {
        self.connection_rx.clone()
    }

    async fn set_remote_description(
        &self,
        desc: SessionSdp,
    ) -> std::result::Result<(), NegotiationError> {
        let desc = to_rtc_description(&desc)
            .map_err(|e| NegotiationError::SetRemoteDescription(e.to_string()))?;

        self.pc
            .set_remote_description(desc)
            .await
            .map_err(|e| NegotiationError::SetRemoteDescription(e.to_string()))
    }
}

fn to_rtc_description(
    desc: &SessionSdp,
) -> std::result::Result<RTCSessionDescription, webrtc::Error> {
    match desc.sdp_type {
        SdpType::Offer => RTCSessionDescription::offer(desc.sdp.clone()),
        SdpType::Answer => RTCSessionDescription::answer(desc.sdp.clone()),
    }
}
