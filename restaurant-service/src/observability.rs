//! Tracing initialization.

use std::sync::Once;

use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Install the global tracing subscriber.
///
/// `RUST_LOG` overrides `default_level`. Safe to call more than once; only
/// the first call installs.
pub fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.to_string()));

    INIT.call_once(|| {
        fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    });
}
