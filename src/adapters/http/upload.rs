//! HTTP upload sidecar.
//!
//! Multipart `POST /upload` carrying the file and the session identifier
//! as a `sessionId` text field. A before-upload gate runs first; the
//! default gate enforces the configured content types and size ceiling.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::{EndpointsConfig, UploadConfig};
use crate::domain::SessionId;
use crate::ports::{BeforeUpload, UploadError, UploadReceipt, UploadRequest, UploadSidecar, CODE_OK};

use super::dto::UploadResponse;

/// Builds the default gate from the configured constraints.
pub fn default_gate(config: UploadConfig) -> BeforeUpload {
    Arc::new(move |request: &UploadRequest| {
        if !config.accepts(&request.content_type) {
            return Err(UploadError::Vetoed(format!(
                "content type {} not accepted",
                request.content_type
            )));
        }
        if request.size() > config.max_size_bytes {
            return Err(UploadError::Vetoed(format!(
                "file exceeds {} bytes",
                config.max_size_bytes
            )));
        }
        Ok(())
    })
}

/// reqwest-backed implementation of [`UploadSidecar`].
pub struct HttpUploadSidecar {
    client: Client,
    upload_url: String,
    gate: BeforeUpload,
}

impl HttpUploadSidecar {
    /// Creates a sidecar with the default constraint gate.
    pub fn new(endpoints: &EndpointsConfig, upload: UploadConfig) -> Self {
        Self::with_gate(endpoints, default_gate(upload))
    }

    /// Creates a sidecar with a caller-supplied before-upload gate.
    pub fn with_gate(endpoints: &EndpointsConfig, gate: BeforeUpload) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(endpoints.request_timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            upload_url: endpoints.upload_url(),
            gate,
        }
    }
}

#[async_trait]
impl UploadSidecar for HttpUploadSidecar {
    async fn upload(
        &self,
        session_id: SessionId,
        request: UploadRequest,
    ) -> Result<UploadReceipt, UploadError> {
        (self.gate)(&request)?;

        let file_name = request.file_name.clone();
        let part = Part::bytes(request.data)
            .file_name(file_name.clone())
            .mime_str(&request.content_type)
            .map_err(|e| UploadError::Io(e.to_string()))?;
        let form = Form::new()
            .text("sessionId", session_id.to_string())
            .part("file", part);

        let response = self
            .client
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| UploadError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(%session_id, %status, "upload rejected by transport");
            return Err(UploadError::Rejected {
                code: status.as_u16() as u32,
            });
        }

        let envelope: UploadResponse = response
            .json()
            .await
            .map_err(|e| UploadError::Network(e.to_string()))?;

        if envelope.code != CODE_OK {
            warn!(%session_id, code = envelope.code, "upload rejected");
            return Err(UploadError::Rejected {
                code: envelope.code,
            });
        }

        let acknowledged = envelope.name.unwrap_or(file_name);
        info!(%session_id, file = %acknowledged, "upload complete");
        Ok(UploadReceipt {
            file_name: acknowledged,
        })
    }
}
