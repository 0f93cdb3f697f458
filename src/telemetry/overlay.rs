//! Point projection and render sinks
//!
//! Decoded coordinates are normalized; the overlay scales them to the
//! configured display surface. Rendering proper lives behind
//! [`PointSink`] so the session loop stays independent of the output
//! medium (terminal, pipe, a future GUI).

use std::io::Write;

use serde::Serialize;
use tracing::trace;

use super::decoder::Point;

/// Display surface dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

/// A point scaled to surface pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PixelPoint {
    pub x: f32,
    pub y: f32,
}

/// Projects normalized telemetry points onto a display surface.
#[derive(Debug, Clone)]
pub struct Overlay {
    surface: SurfaceSize,
}

impl Overlay {
    pub fn new(surface: SurfaceSize) -> Self {
        Self { surface }
    }

    pub fn surface(&self) -> SurfaceSize {
        self.surface
    }

    /// Scale one telemetry frame to pixel space.
    pub fn project(&self, points: &[Point]) -> Vec<PixelPoint> {
        let w = self.surface.width as f32;
        let h = self.surface.height as f32;
        points
            .iter()
            .map(|p| PixelPoint {
                x: p.x * w,
                y: p.y * h,
            })
            .collect()
    }
}

/// Consumer of projected telemetry frames.
pub trait PointSink: Send {
    fn render(&mut self, frame: &[PixelPoint]);
}

/// Logs each frame at trace level. The default sink when no output was
/// requested: the session still counts frames and points in its stats.
#[derive(Debug, Default)]
pub struct TraceSink;

impl PointSink for TraceSink {
    fn render(&mut self, frame: &[PixelPoint]) {
        trace!("telemetry frame: {} points", frame.len());
    }
}

/// Writes one JSON array per frame, one frame per line.
pub struct JsonlSink<W: Write + Send> {
    out: W,
}

impl JsonlSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self {
            out: std::io::stdout(),
        }
    }
}

impl<W: Write + Send> JsonlSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write + Send> PointSink for JsonlSink<W> {
    fn render(&mut self, frame: &[PixelPoint]) {
        match serde_json::to_string(frame) {
            Ok(line) => {
                if let Err(e) = writeln!(self.out, "{line}") {
                    trace!("point sink write failed: {e}");
                }
            }
            Err(e) => trace!("point sink serialization failed: {e}"),
        }
    }
}
