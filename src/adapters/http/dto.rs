//! Wire DTOs for the backend's HTTP endpoints.
//!
//! The backend wraps every reply in a `{code, ...}` envelope; 200 is the
//! only success code.

use serde::{Deserialize, Serialize};

use crate::domain::{SessionId, UserId};

/// Body of `POST /create_session`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateSessionRequest {
    pub user_id: UserId,
}

/// Data section of the session-creation reply.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct CreateSessionData {
    #[serde(default)]
    pub session_id: Option<SessionId>,
}

/// Envelope of the session-creation reply: `{code, data: {session_id}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSessionResponse {
    pub code: u32,
    #[serde(default)]
    pub data: CreateSessionData,
}

/// Envelope of the upload reply: `{code, name?}`.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    pub code: u32,
    #[serde(default)]
    pub name: Option<String>,
}
