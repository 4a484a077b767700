//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid base URL format")]
    InvalidBaseUrl,

    #[error("Invalid channel URL format")]
    InvalidChannelUrl,

    #[error("No transport configured")]
    NoTransportConfigured,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Retry backoff must not be zero")]
    InvalidBackoff,

    #[error("Maximum upload size must not be zero")]
    InvalidUploadSize,

    #[error("No accepted upload content types configured")]
    NoAcceptedContentTypes,
}
