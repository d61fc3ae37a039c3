//! Opt-in logging setup for embedders.
//!
//! The library logs through the `log` facade. Hosts that already run a
//! subscriber need nothing from here; others can install the default
//! tracing pipeline once at startup.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Installs a formatted tracing subscriber with an `info` default filter.
pub fn init() {
    init_with_filter("info");
}

/// Installs a formatted tracing subscriber, honoring `RUST_LOG` and
/// falling back to the given directive. Safe to call more than once; later
/// calls are no-ops.
pub fn init_with_filter(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    // Route `log` macro records into tracing. Errors mean a logger is
    // already installed, which is fine.
    let _ = tracing_log::LogTracer::init();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
