//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::error::{AppResult, DaqError};

/// Build the filter: `RUST_LOG` if set, else the configured level.
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.to_ascii_lowercase()))
}

/// Install the global subscriber.
///
/// Fails with [`DaqError::Logging`] if a global subscriber is already set.
pub fn init(config: &LoggingConfig) -> AppResult<()> {
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter(config));
    let result = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| DaqError::Logging(e.to_string()))
}
