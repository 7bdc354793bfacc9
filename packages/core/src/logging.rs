//! Tracing setup for binaries, benches and tests
//!
//! The library only emits `tracing` events; installing a subscriber is left
//! to the embedding application. `init_tracing` is a convenience for callers
//! that don't have one.

use tracing_subscriber::EnvFilter;

/// Install a `fmt` subscriber filtered by `RUST_LOG` (default `info`)
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}
