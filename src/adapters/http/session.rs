//! HTTP session negotiator.
//!
//! Issues `POST /create_session` with the caller's user id and unwraps the
//! `{code, data: {session_id}}` envelope. Transient transport faults are
//! retried with bounded exponential backoff; protocol rejections fail fast.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::{EndpointsConfig, RetryConfig};
use crate::domain::{SessionId, UserId};
use crate::ports::{SessionError, SessionNegotiator, CODE_OK};

use super::dto::{CreateSessionRequest, CreateSessionResponse};

/// reqwest-backed implementation of [`SessionNegotiator`].
pub struct HttpSessionNegotiator {
    client: Client,
    create_session_url: String,
    retry: RetryConfig,
}

impl HttpSessionNegotiator {
    /// Creates a negotiator for the configured endpoints.
    pub fn new(endpoints: &EndpointsConfig, retry: RetryConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(endpoints.request_timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            create_session_url: endpoints.create_session_url(),
            retry,
        }
    }

    async fn attempt(&self, user_id: UserId) -> Result<SessionId, SessionError> {
        let body = CreateSessionRequest { user_id };

        let response = self
            .client
            .post(&self.create_session_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SessionError::Timeout
                } else {
                    SessionError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SessionError::Rejected {
                code: status.as_u16() as u32,
            });
        }

        let envelope: CreateSessionResponse = response
            .json()
            .await
            .map_err(|e| SessionError::MalformedResponse(e.to_string()))?;

        if envelope.code != CODE_OK {
            return Err(SessionError::Rejected {
                code: envelope.code,
            });
        }

        envelope.data.session_id.ok_or_else(|| {
            SessionError::MalformedResponse("success envelope without session_id".to_string())
        })
    }
}

#[async_trait]
impl SessionNegotiator for HttpSessionNegotiator {
    async fn create_session(&self, user_id: UserId) -> Result<SessionId, SessionError> {
        let mut attempt = 0;
        loop {
            match self.attempt(user_id).await {
                Ok(session_id) => {
                    info!(%session_id, %user_id, "session created");
                    return Ok(session_id);
                }
                Err(err) if err.is_retryable() && attempt + 1 < self.retry.max_attempts => {
                    let backoff = self.retry.backoff_for(attempt);
                    warn!(
                        %err,
                        attempt = attempt + 1,
                        backoff_ms = backoff.as_millis() as u64,
                        "session negotiation failed, retrying"
                    );
                    sleep(backoff).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
