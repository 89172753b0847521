//! Helpers to wrangle logging across Harbor crates.
//!
//! NOTE: [initialize_tracing] should only ever be called in tests or binaries;
//! a library should only concern itself with instrumentation and logging.
use std::sync::Once;

static INITIALIZE_TRACING: Once = Once::new();

/// The filter used when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "harbor_fetch=info,harbor_storage=info,harbor_transcribe=info";

/// Install a global [tracing_subscriber] registry that formats events to
/// stdout, filtered by `RUST_LOG` (or `default_filter` when `RUST_LOG` is
/// unset). Subsequent calls are no-ops.
pub fn initialize_tracing(default_filter: Option<&str>) {
    use tracing_subscriber::prelude::*;

    INITIALIZE_TRACING.call_once(|| {
        let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
            default_filter
                .unwrap_or(DEFAULT_LOG_FILTER)
                .to_string()
        });

        // Another subscriber may already be installed by the host binary
        let _ = tracing_subscriber::registry()
            .with(tracing_subscriber::EnvFilter::new(filter))
            .with(tracing_subscriber::fmt::layer())
            .try_init();
    });
}
