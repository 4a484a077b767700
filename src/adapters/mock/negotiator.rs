//! Scripted session negotiator.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use crate::domain::{SessionId, UserId};
use crate::ports::{SessionError, SessionNegotiator};

/// Negotiator that replays a scripted outcome and records invocations.
pub struct MockSessionNegotiator {
    outcome: Mutex<Result<SessionId, SessionError>>,
    calls: AtomicU32,
}

impl MockSessionNegotiator {
    /// Always resolves with the given session id.
    pub fn succeeding(session_id: SessionId) -> Self {
        Self {
            outcome: Mutex::new(Ok(session_id)),
            calls: AtomicU32::new(0),
        }
    }

    /// Always fails with the given error.
    pub fn failing(error: SessionError) -> Self {
        Self {
            outcome: Mutex::new(Err(error)),
            calls: AtomicU32::new(0),
        }
    }

    /// Number of times `create_session` was invoked.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionNegotiator for MockSessionNegotiator {
    async fn create_session(&self, _user_id: UserId) -> Result<SessionId, SessionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.lock().expect("outcome poisoned").clone()
    }
}
