use std::sync::Once;

use anyhow::Result;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Registry, fmt};

static TEST_INIT: Once = Once::new();

/// Installs the global `fmt` subscriber.
///
/// `level` is an `EnvFilter` directive such as `"info"` or `"calcwit=trace"`;
/// `RUST_LOG` takes precedence when set.
pub fn init_tracing(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;
    let layer = fmt::layer().with_target(true).with_level(true);
    tracing::subscriber::set_global_default(Registry::default().with(filter).with(layer))?;
    Ok(())
}

/// Debug-level logging routed through the test writer, installed once per test binary.
pub fn init_test_logging() {
    TEST_INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
        let layer = fmt::layer().with_target(true).with_test_writer();
        let _ = tracing::subscriber::set_global_default(Registry::default().with(filter).with(layer));
    });
}
