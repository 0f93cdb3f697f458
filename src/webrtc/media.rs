//! Local media capability
//!
//! facelink does not capture frames itself; the embedder owns the camera
//! and pushes encoded samples through [`LocalVideoTrack::write_sample`].
//! This module only owns the track handle the peer connection negotiates
//! with.

use std::sync::Arc;

use webrtc::media::Sample;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

use crate::error::{AppError, Result};

/// Video source configuration
#[derive(Debug, Clone)]
pub struct VideoSourceConfig {
    /// Track ID
    pub track_id: String,
    /// Stream ID
    pub stream_id: String,
    /// RTP MIME type
    pub mime_type: String,
    /// Clock rate
    pub clock_rate: u32,
    /// SDP format parameters advertised for the track
    pub sdp_fmtp_line: String,
}

impl Default for VideoSourceConfig {
    fn default() -> Self {
        Self {
            track_id: "video0".to_string(),
            stream_id: "facelink-stream".to_string(),
            mime_type: "video/H264".to_string(),
            clock_rate: 90000,
            sdp_fmtp_line: "level-asymmetry-allowed=1;packetization-mode=1;profile-level-id=42e01f"
                .to_string(),
        }
    }
}

/// Send-only video track handle.
pub struct LocalVideoTrack {
    track: Arc<TrackLocalStaticSample>,
}

impl LocalVideoTrack {
    pub fn new(config: VideoSourceConfig) -> Self {
        let capability = RTCRtpCodecCapability {
            mime_type: config.mime_type,
            clock_rate: config.clock_rate,
            channels: 0,
            sdp_fmtp_line: config.sdp_fmtp_line,
            rtcp_feedback: vec![],
        };
        let track = Arc::new(TrackLocalStaticSample::new(
            capability,
            config.track_id,
            config.stream_id,
        ));
        Self { track }
    }

    /// The track handle to register on a peer connection.
    pub fn rtp_track(&self) -> Arc<TrackLocalStaticSample> {
        self.track.clone()
    }

    /// Push one encoded sample from the capture source.
    pub async fn write_sample(&self, sample: &Sample) -> Result<()> {
        self.track
            .write_sample(sample)
            .await
            .map_err(|e| AppError::WebRtc(format!("failed to write video sample: {e}")))
    }
}
