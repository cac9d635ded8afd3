//! Log setup for the `modelq` binary.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `MODELQ_LOG=modelq.sql=debug`.
pub const LOG_ENV: &str = "MODELQ_LOG";

/// Install a stderr `fmt` subscriber filtered by [`LOG_ENV`] (default `info`).
///
/// Calling it twice is harmless; the second install is ignored.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
