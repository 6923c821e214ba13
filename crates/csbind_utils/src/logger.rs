use tracing_subscriber::EnvFilter;

/// Environment variable holding an `EnvFilter` directive, e.g. `csbind_gen=debug`.
pub const LOG_ENV: &str = "CSBIND_LOG";

/// Install the global `tracing` subscriber.
///
/// `CSBIND_LOG` wins over `verbose`; a second call is a no-op so tests and
/// embedders can call this freely.
pub fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
