//! Landmark telemetry: data-channel payload decoding and projection
//!
//! The inference server sends one message per processed frame: a headerless
//! run of little-endian 32-bit floats, pairs of normalized `(x, y)`
//! coordinates. The message boundary is the channel's framing; there is no
//! length or type field to parse.

pub mod decoder;
pub mod overlay;

pub use decoder::{decode_points, Point, TelemetryError};
pub use overlay::{JsonlSink, Overlay, PixelPoint, PointSink, SurfaceSize, TraceSink};
