//! Tracing setup shared by the binaries.

use tracing_subscriber::EnvFilter;

/// Install a `fmt` subscriber on stderr filtered by `RUST_LOG`, defaulting to
/// `info`.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
