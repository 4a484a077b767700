//! Upload constraints configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Constraints the default before-upload gate enforces
#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Content types the backend accepts.
    #[serde(default = "default_accepted_content_types")]
    pub accepted_content_types: Vec<String>,

    /// Maximum file size in bytes.
    #[serde(default = "default_max_size")]
    pub max_size_bytes: u64,
}

impl UploadConfig {
    /// Returns true if the given content type is accepted.
    pub fn accepts(&self, content_type: &str) -> bool {
        self.accepted_content_types
            .iter()
            .any(|t| t == content_type)
    }

    /// Validate upload configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.accepted_content_types.is_empty() {
            return Err(ValidationError::NoAcceptedContentTypes);
        }
        if self.max_size_bytes == 0 {
            return Err(ValidationError::InvalidUploadSize);
        }
        Ok(())
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            accepted_content_types: default_accepted_content_types(),
            max_size_bytes: default_max_size(),
        }
    }
}

// The backend stores and parses only plain text and PDF.
fn default_accepted_content_types() -> Vec<String> {
    vec!["text/plain".to_string(), "application/pdf".to_string()]
}

fn default_max_size() -> u64 {
    10 * 1024 * 1024
}
