//! Tracing setup for the host process.

use imp_config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset: the configured one, or `info` if
/// that does not parse.
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .unwrap_or_else(|e| {
            eprintln!("imp: invalid log filter {:?}: {e}", config.filter);
            EnvFilter::new("info")
        })
}

/// Install a stderr subscriber. Only the first call in a process wins; a
/// host that already installed its own subscriber keeps it.
pub fn init_tracing(config: &LoggingConfig) {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter(config))
        .try_init()
        .ok();
}
