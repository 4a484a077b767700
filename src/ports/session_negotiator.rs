//! Session negotiator port.
//!
//! One-shot acquisition of the session identifier that scopes all
//! subsequent messaging and uploads. Invoked exactly once per coordinator
//! lifecycle; failure leaves the exchange in `AwaitingSession` and every
//! send blocked.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{SessionId, UserId};

/// Errors that occur during session negotiation.
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    /// The endpoint answered, but with a non-success code.
    #[error("session creation rejected with code {code}")]
    Rejected { code: u32 },

    /// The endpoint answered with a body we could not interpret.
    #[error("malformed session response: {0}")]
    MalformedResponse(String),

    /// Transport-level fault reaching the endpoint.
    #[error("network failure during session negotiation: {0}")]
    Network(String),

    /// The request did not complete within the configured timeout.
    #[error("session negotiation timed out")]
    Timeout,
}

impl SessionError {
    /// Returns true if retrying the negotiation may succeed.
    ///
    /// Protocol rejections are final; transport faults and timeouts are
    /// worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout)
    }
}

/// Port for obtaining a session identifier from the backend.
#[async_trait]
pub trait SessionNegotiator: Send + Sync {
    /// Creates a session for the given user.
    ///
    /// # Errors
    ///
    /// - `Rejected` on a non-success response code
    /// - `MalformedResponse` if the success payload is missing or invalid
    /// - `Network` / `Timeout` on transport faults
    async fn create_session(&self, user_id: UserId) -> Result<SessionId, SessionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_negotiator_is_object_safe() {
        fn _accepts_dyn(_negotiator: &dyn SessionNegotiator) {}
    }

    #[test]
    fn rejection_is_not_retryable() {
        assert!(!SessionError::Rejected { code: 500 }.is_retryable());
        assert!(!SessionError::MalformedResponse("x".into()).is_retryable());
    }

    #[test]
    fn transport_faults_are_retryable() {
        assert!(SessionError::Network("refused".into()).is_retryable());
        assert!(SessionError::Timeout.is_retryable());
    }
}
