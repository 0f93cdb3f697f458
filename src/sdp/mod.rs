//! SDP session-description handling
//!
//! This module restricts a media section of an SDP offer to a single codec
//! before the offer is sent to the inference server. Browsers and the
//! `webrtc` crate put every negotiable codec into the offer; the server
//! pins its decoder to one, so the offer is rewritten to advertise only the
//! target codec and the payload types that retransmit it.
//!
//! The filter is a pure text transform over the description's lines; it
//! never fails. An offer without the target codec degrades to a media
//! section with an empty payload list, which callers can detect with
//! [`FilteredSdp::require_codec`].

mod filter;
mod line;

pub use filter::{filter_codec, AllowedSet, CodecNotFound, FilteredSdp};
