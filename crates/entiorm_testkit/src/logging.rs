//! Test log output.

use std::sync::Once;
use tracing_subscriber::EnvFilter;

/// Routes `tracing` output to the test harness.
///
/// The level comes from `RUST_LOG` and defaults to `warn`. Only the first
/// call installs the subscriber.
pub fn init_test_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}
