//! Shared helpers for the server behaviour suites.

mod client;
mod config_loader;
mod reporter;

pub use client::FrameClient;
pub use config_loader::{DefaultConfigLoader, FailingConfigLoader, TestConfigLoader};
pub use reporter::{HealthEvent, RecordingHealthReporter};
