use tracing_subscriber::EnvFilter;

/// Initializes the tracing subscriber.
///
/// Events go to stderr so that stdout stays free for report lines. The filter
/// comes from `RUST_LOG` and falls back to `info`.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
}
