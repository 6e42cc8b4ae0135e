use tracing_subscriber::EnvFilter;

/// Preferred filter variable; `RUST_LOG` is the fallback.
const LOG_ENV: &str = "BUNKSMART_LOG";
const DEFAULT_FILTER: &str = "warn";

/// Install the stderr subscriber. Stdout stays reserved for command output.
pub fn init() {
    let env_filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
