//! Updates the coordinator publishes to the presenter.
//!
//! The presenter renders conversation state; it never reaches into the
//! coordinator. Everything it needs arrives as one of these events.

use thiserror::Error;

use crate::domain::{ConversationMessage, MessageError, SessionId};
use crate::ports::ChannelError;

/// A state mutation the presenter should render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationUpdate {
    /// Negotiation resolved; sending is now permitted.
    SessionReady(SessionId),

    /// A message entered the conversation (local or remote).
    MessageAppended(ConversationMessage),

    /// The typing indicator changed.
    TypingChanged(bool),

    /// The upload affordance should close. `success` selects between the
    /// acknowledgement message (already appended) and a failure notice.
    UploadSettled { success: bool },

    /// Transient user-visible notice; conversation state is unaffected.
    Notice(String),
}

/// Why a send intent was refused.
#[derive(Debug, Error)]
pub enum SendError {
    /// Negotiation has not resolved; messaging is blocked.
    #[error("no session has been established")]
    SessionNotReady,

    /// A reply is still outstanding; at most one send may be in flight.
    #[error("a reply to the previous send is still outstanding")]
    ReplyOutstanding,

    /// The content failed validation (empty or whitespace-only).
    #[error(transparent)]
    InvalidMessage(#[from] MessageError),

    /// The channel refused the outbound event.
    #[error("channel failure: {0}")]
    Channel(#[from] ChannelError),
}
