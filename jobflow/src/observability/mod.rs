//! Logging for pipeline runs.
//!
//! The engine always emits `tracing` events. When debug mode is enabled it
//! additionally writes human-readable lines to an injected [`LogSink`].

mod log_sink;

pub use log_sink::{LogSink, MemoryLogSink, StdoutLogSink, TracingLogSink};

#[cfg(test)]
pub use log_sink::MockLogSink;

use tracing::Subscriber;
use tracing_subscriber::EnvFilter;

/// Environment variable read by [`init_tracing`] for the filter directive.
pub const LOG_FILTER_ENV: &str = "JOBFLOW_LOG";

fn env_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new(default_directive))
}

/// Builds the fmt subscriber used by [`init_tracing`] without installing it.
///
/// Filtered by `JOBFLOW_LOG`, falling back to `default_directive` when the
/// variable is unset or invalid.
#[must_use]
pub fn fmt_subscriber(default_directive: &str) -> impl Subscriber + Send + Sync {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_directive))
        .with_target(true)
        .finish()
}

/// Installs [`fmt_subscriber`] as the global default.
///
/// Returns false if a global subscriber was already installed.
pub fn init_tracing(default_directive: &str) -> bool {
    tracing::subscriber::set_global_default(fmt_subscriber(default_directive)).is_ok()
}

/// Installs a global JSON subscriber filtered by `JOBFLOW_LOG`.
pub fn init_json_tracing(default_directive: &str) -> bool {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(env_filter(default_directive))
        .try_init()
        .is_ok()
}
