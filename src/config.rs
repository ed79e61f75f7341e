//! Configuration loaded with figment.
//!
//! Sources, lowest to highest precedence:
//! 1. Built-in defaults
//! 2. An optional TOML file
//! 3. Environment variables prefixed with `DAQPROPS_`
//!
//! Nested keys are separated by a double underscore:
//!
//! ```text
//! DAQPROPS_LOGGING__LEVEL=debug
//! DAQPROPS_DISCOVERY__INITIAL_LIST=false
//! DAQPROPS_SESSION__MAX_NOTIFICATIONS_PER_PUMP=0
//! ```
//!
//! # Example
//!
//! ```no_run
//! use daq_properties::config::PropertiesConfig;
//!
//! let config = PropertiesConfig::load(Some("daq-properties.toml".as_ref()))?;
//! println!("log level: {}", config.logging.level);
//! # Ok::<(), daq_properties::config::ConfigError>(())
//! ```

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "DAQPROPS_";

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source could not be read or parsed.
    #[error("Configuration load error: {0}")]
    LoadError(#[from] figment::Error),
    /// Values parsed but are not acceptable.
    #[error("Configuration validation error: {0}")]
    ValidationError(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertiesConfig {
    /// Diagnostics output.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Configurable discovery.
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    /// Device session.
    #[serde(default)]
    pub session: SessionConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter level (trace, debug, info, warn, error). `RUST_LOG`
    /// overrides it.
    #[serde(default = "default_level")]
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
        }
    }
}

/// Discovery configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// List every enumerable property right after discovery.
    #[serde(default = "default_true")]
    pub initial_list: bool,
    /// Wire the dependency rule table.
    #[serde(default = "default_true")]
    pub wire_dependencies: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            initial_list: true,
            wire_dependencies: true,
        }
    }
}

/// Session configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Maximum notifications routed per `process_pending` call (0 = unbounded).
    #[serde(default = "default_max_notifications")]
    pub max_notifications_per_pump: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_notifications_per_pump: default_max_notifications(),
        }
    }
}

// ============================================================================
// Default value functions
// ============================================================================

fn default_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_notifications() -> usize {
    1024
}

// ============================================================================
// Loading and validation
// ============================================================================

const VALID_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

impl PropertiesConfig {
    /// Load defaults, the optional TOML file and environment overrides,
    /// then validate.
    ///
    /// A missing file is not an error; figment treats it as empty.
    ///
    /// # Errors
    ///
    /// Returns a ConfigError if a source cannot be parsed or validation
    /// fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(PropertiesConfig::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        let config: Self = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(ConfigError::LoadError)?;

        config.validate()?;
        Ok(config)
    }

    /// Check semantic constraints serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let level = self.logging.level.to_ascii_lowercase();
        if !VALID_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid logging.level '{}'. Must be one of: {}",
                self.logging.level,
                VALID_LEVELS.join(", ")
            )));
        }
        Ok(())
    }
}
