//! Tracing setup for the binary.

use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the configured log filter.
pub const LOG_ENV: &str = "CREDVAULT_LOG";

/// Build the filter: `CREDVAULT_LOG` if set and valid, else `credvault={level}`.
pub fn filter(config_level: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(format!("credvault={config_level},warn")))
}

/// Install a stderr subscriber. Safe to call more than once; later calls are no-ops.
pub fn init(config_level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(config_level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
