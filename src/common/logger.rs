use std::sync::Once;

static INIT: Once = Once::new();

/// Install the process logger. `RUST_LOG` wins over the configured filter.
/// Later calls are no-ops.
pub fn init(filter: &str) {
    INIT.call_once(|| {
        let env = env_logger::Env::default().default_filter_or(filter.to_string());
        let _ = env_logger::Builder::from_env(env)
            .format_timestamp_millis()
            .try_init();
    });
}
