//! Logging setup.
//!
//! The library only emits `tracing` events; installing a subscriber is
//! left to binaries and tests.

use tracing_subscriber::{fmt, EnvFilter};

/// Installs a global subscriber writing to stderr.
///
/// # Environment
/// - `RUST_LOG`: filter directive (default: `info`),
///   e.g. `RUST_LOG=u_dose=debug`
///
/// # Example
/// ```no_run
/// u_dose::logging::init();
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .init();
}

/// Debug-level subscriber for tests; safe to call repeatedly.
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
