//! facelink - WebRTC face-landmark streaming client
//!
//! This crate provides the core functionality for facelink, a headless
//! client that streams local video to a remote inference server over
//! WebRTC and receives face-landmark telemetry back on a data channel.

pub mod config;
pub mod error;
pub mod sdp;
pub mod session;
pub mod telemetry;
pub mod webrtc;

pub use error::{AppError, Result};
