//! Scripted upload sidecar.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::domain::SessionId;
use crate::ports::{UploadError, UploadReceipt, UploadRequest, UploadSidecar};

/// Sidecar that replays a scripted outcome and records the session each
/// transfer was correlated to.
pub struct MockUploadSidecar {
    outcome: Mutex<Result<UploadReceipt, UploadError>>,
    uploads: Mutex<Vec<(SessionId, String)>>,
}

impl MockUploadSidecar {
    /// Always acknowledges with the uploaded file's name.
    pub fn succeeding() -> Self {
        Self {
            outcome: Mutex::new(Ok(UploadReceipt {
                file_name: String::new(),
            })),
            uploads: Mutex::new(Vec::new()),
        }
    }

    /// Always fails with the given error.
    pub fn failing(error: UploadError) -> Self {
        Self {
            outcome: Mutex::new(Err(error)),
            uploads: Mutex::new(Vec::new()),
        }
    }

    /// Session/file pairs transferred so far.
    pub fn uploads(&self) -> Vec<(SessionId, String)> {
        self.uploads.lock().expect("uploads poisoned").clone()
    }
}

#[async_trait]
impl UploadSidecar for MockUploadSidecar {
    async fn upload(
        &self,
        session_id: SessionId,
        request: UploadRequest,
    ) -> Result<UploadReceipt, UploadError> {
        self.uploads
            .lock()
            .expect("uploads poisoned")
            .push((session_id, request.file_name.clone()));
        match &*self.outcome.lock().expect("outcome poisoned") {
            Ok(_) => Ok(UploadReceipt {
                file_name: request.file_name,
            }),
            Err(e) => Err(e.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn succeeding_echoes_file_name() {
        let mock = MockUploadSidecar::succeeding();
        let request = UploadRequest::new("doc.pdf", "application/pdf", vec![1, 2, 3]);
        let receipt = mock.upload(SessionId::new(3), request).await.unwrap();
        assert_eq!(receipt.file_name, "doc.pdf");
        assert_eq!(mock.uploads(), vec![(SessionId::new(3), "doc.pdf".to_string())]);
    }

    #[tokio::test]
    async fn failing_returns_scripted_error() {
        let mock = MockUploadSidecar::failing(UploadError::Rejected { code: 500 });
        let request = UploadRequest::new("doc.pdf", "application/pdf", vec![]);
        let result = mock.upload(SessionId::new(3), request).await;
        assert!(matches!(result, Err(UploadError::Rejected { code: 500 })));
    }
}
