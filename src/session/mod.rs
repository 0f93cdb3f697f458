//! Session lifecycle: one peer, one negotiation, one telemetry loop

pub mod controller;

pub use controller::{SessionController, SessionStats};
