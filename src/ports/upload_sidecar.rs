//! Upload sidecar port.
//!
//! File transfer travels out-of-band over HTTP, correlated to the
//! conversation only by the session identifier it carries as form
//! metadata. The sidecar never touches the realtime channel; the
//! coordinator folds the completion back into conversation state.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::SessionId;

/// A file staged for upload.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl UploadRequest {
    /// Creates a request from in-memory bytes.
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            data,
        }
    }

    /// Reads a file from disk, inferring the content type from its
    /// extension (the backend only accepts text and PDF).
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, UploadError> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| UploadError::Io("path has no file name".to_string()))?
            .to_string();
        let content_type = match path.extension().and_then(|e| e.to_str()) {
            Some("txt") => "text/plain",
            Some("pdf") => "application/pdf",
            _ => "application/octet-stream",
        };
        let data = tokio::fs::read(path)
            .await
            .map_err(|e| UploadError::Io(e.to_string()))?;
        Ok(Self::new(file_name, content_type, data))
    }

    /// Size of the staged file in bytes.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// Successful upload acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    /// File name the backend acknowledged receiving.
    pub file_name: String,
}

/// Errors raised by the upload sidecar.
#[derive(Debug, Clone, Error)]
pub enum UploadError {
    /// The before-upload gate refused the file; no transfer was attempted.
    #[error("upload vetoed: {0}")]
    Vetoed(String),

    /// The endpoint answered with a non-success code.
    #[error("upload rejected with code {code}")]
    Rejected { code: u32 },

    /// Transport-level fault during the transfer.
    #[error("network failure during upload: {0}")]
    Network(String),

    /// Local filesystem fault while staging the file.
    #[error("upload I/O failure: {0}")]
    Io(String),
}

/// Gate consulted before any transfer begins. Returning an error vetoes
/// the file; the default gate enforces the configured content types and
/// size limit.
pub type BeforeUpload = Arc<dyn Fn(&UploadRequest) -> Result<(), UploadError> + Send + Sync>;

/// Port for session-correlated file transfer.
#[async_trait]
pub trait UploadSidecar: Send + Sync {
    /// Transfers a file, carrying the session identifier as metadata.
    ///
    /// # Errors
    ///
    /// - `Vetoed` if the before-upload gate refused the file
    /// - `Rejected` on a non-success response code
    /// - `Network` / `Io` on transport or staging faults
    async fn upload(
        &self,
        session_id: SessionId,
        request: UploadRequest,
    ) -> Result<UploadReceipt, UploadError>;
}
