//! Structured logging with `tracing`.
//!
//! Every crate logs through the `tracing` macros with structured fields
//! (`url`, `attempt`, `code`, `kind`, ...). Binaries call [`init_subscriber`]
//! once; library code never installs a subscriber.
//!
//! [`test_utils`] provides an in-memory capture layer so tests can assert on
//! emitted events, including their fields.

pub mod test_utils;

pub use test_utils::{CapturedEvent, CapturedLogs, capture_logs};

/// Initialize the global tracing subscriber with stderr output.
///
/// `RUST_LOG` takes precedence over `level` when set. Subsequent calls are
/// no-ops.
pub fn init_subscriber(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact();

    // try_init fails only when a global subscriber is already installed
    let _ = subscriber.try_init();
}
