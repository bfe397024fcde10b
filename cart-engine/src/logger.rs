//! Logging Infrastructure
//!
//! Subscriber setup for embeddings that do not bring their own.

use tracing_subscriber::EnvFilter;

/// Initialize the logger at the default `info` level.
pub fn init_logger() {
    init_logger_with_level(None);
}

/// Initialize the logger with an explicit level, honoring `RUST_LOG` when set.
///
/// Safe to call more than once (later calls are no-ops), so tests and
/// embedding applications cannot trip over each other.
pub fn init_logger_with_level(log_level: Option<&str>) {
    let level = log_level.unwrap_or("info");
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false)
        .try_init();
}
