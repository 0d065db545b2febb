//! Process-wide tracing setup shared by editor hosts and tests.

pub mod subscriber;

pub use subscriber::{LOG_FORMAT_ENV, LogFormat, ObservabilityConfig};

/// Initialize tracing with the environment-derived configuration.
///
/// Safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    subscriber::init(&ObservabilityConfig::from_env());
}
