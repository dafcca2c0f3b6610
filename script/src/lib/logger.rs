use tracing_subscriber::EnvFilter;

/// Installs the global subscriber, filtered by `RUST_LOG` and defaulting to `info`.
pub fn setup_logger() {
    let filter: EnvFilter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
