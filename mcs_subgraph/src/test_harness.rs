use std::sync::Once;

static INIT: Once = Once::new();

/// Configures logging for the test runner. Honors `RUST_LOG`.
pub(crate) fn init_test_logger() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}
