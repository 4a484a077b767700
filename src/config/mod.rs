//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment
//! variables using the `config` and `dotenvy` crates. Configuration is
//! loaded with the `CONFAB` prefix and nested values use double underscores
//! as separators.
//!
//! # Example
//!
//! ```no_run
//! use confab::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Backend at {}", config.endpoints.base_url);
//! ```

mod endpoints;
mod error;
mod retry;
mod upload;

pub use endpoints::{EndpointsConfig, TransportKind};
pub use error::{ConfigError, ValidationError};
pub use retry::RetryConfig;
pub use upload::UploadConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Every section has sensible defaults, so a bare environment yields a
/// client pointed at a local backend.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    /// Backend endpoints (HTTP base, channel namespace, timeouts)
    #[serde(default)]
    pub endpoints: EndpointsConfig,

    /// Retry policy for negotiation and reconnection
    #[serde(default)]
    pub retry: RetryConfig,

    /// Upload constraints enforced by the default before-upload gate
    #[serde(default)]
    pub upload: UploadConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `CONFAB` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    ///
    /// # Environment Variable Format
    ///
    /// - `CONFAB__ENDPOINTS__BASE_URL=...` -> `endpoints.base_url = ...`
    /// - `CONFAB__RETRY__MAX_ATTEMPTS=5` -> `retry.max_attempts = 5`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("CONFAB")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.endpoints.validate()?;
        self.retry.validate()?;
        self.upload.validate()?;
        Ok(())
    }
}
