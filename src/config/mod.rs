//! Configuration management

pub mod schema;
pub mod store;

pub use schema::{AppConfig, OutputConfig, ServerConfig, VideoConfig};
pub use store::ConfigStore;
