//! Binary telemetry decoding

use bytes::Buf;
use thiserror::Error;

/// One landmark point, normalized to `[0, 1]` of the remote frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// Telemetry payload errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TelemetryError {
    /// The payload length is not a multiple of the 4-byte float width.
    /// The message cannot be decoded and no partial result is produced.
    #[error("telemetry payload of {len} bytes is not aligned to 32-bit floats")]
    Misaligned { len: usize },
}

/// Decode a telemetry message into its landmark points.
///
/// The buffer holds N little-endian f32 values; every consecutive pair
/// becomes one point. A trailing unpaired value is ignored. Buffers whose
/// length is not 4-byte aligned are rejected outright.
pub fn decode_points(mut data: &[u8]) -> Result<Vec<Point>, TelemetryError> {
    if data.len() % 4 != 0 {
        return Err(TelemetryError::Misaligned { len: data.len() });
    }

    let mut points = Vec::with_capacity(data.len() / 8);
    while data.remaining() >= 8 {
        points.push(Point {
            x: data.get_f32_le(),
            y: data.get_f32_le(),
        });
    }
    Ok(points)
}
