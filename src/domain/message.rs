//! Message entity for the conversation.
//!
//! Messages are immutable once appended. Each carries a content kind, the
//! origin that determines presentation side (local right, remote left), and
//! the time it entered the conversation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::MessageId;

/// Kind-specific message payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "content", rename_all = "snake_case")]
pub enum MessageKind {
    /// Plain text content.
    Text(String),
    /// Image content, referenced by URL.
    Image(String),
}

impl MessageKind {
    /// Returns the text content, if this is a text message.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Image(_) => None,
        }
    }
}

/// Which side of the conversation produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// Sent by this client.
    Local,
    /// Received from (or synthesized on behalf of) the backend.
    Remote,
}

/// Error constructing a message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageError {
    #[error("message content cannot be empty")]
    EmptyContent,
}

/// An immutable message within the conversation.
///
/// # Invariants
///
/// - `id` is unique within the process
/// - text content is non-empty (validated at construction)
/// - `sent_at` is set at construction and never changes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    id: MessageId,
    kind: MessageKind,
    origin: Origin,
    sent_at: DateTime<Utc>,
}

impl ConversationMessage {
    /// Creates a text message with the given origin.
    ///
    /// # Errors
    ///
    /// - `EmptyContent` if the text is empty or whitespace-only
    pub fn text(origin: Origin, content: impl Into<String>) -> Result<Self, MessageError> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(MessageError::EmptyContent);
        }
        Ok(Self {
            id: MessageId::new(),
            kind: MessageKind::Text(content),
            origin,
            sent_at: Utc::now(),
        })
    }

    /// Creates an image message with the given origin.
    ///
    /// # Errors
    ///
    /// - `EmptyContent` if the URL is empty
    pub fn image(origin: Origin, url: impl Into<String>) -> Result<Self, MessageError> {
        let url = url.into();
        if url.trim().is_empty() {
            return Err(MessageError::EmptyContent);
        }
        Ok(Self {
            id: MessageId::new(),
            kind: MessageKind::Image(url),
            origin,
            sent_at: Utc::now(),
        })
    }

    /// Returns the message ID.
    pub fn id(&self) -> &MessageId {
        &self.id
    }

    /// Returns the content kind.
    pub fn kind(&self) -> &MessageKind {
        &self.kind
    }

    /// Returns the origin.
    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// Returns when the message entered the conversation.
    pub fn sent_at(&self) -> DateTime<Utc> {
        self.sent_at
    }

    /// Returns true if this message was produced locally.
    pub fn is_local(&self) -> bool {
        self.origin == Origin::Local
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod construction {
        use super::*;

        #[test]
        fn text_creates_message_with_origin() {
            let msg = ConversationMessage::text(Origin::Local, "hello").unwrap();
            assert_eq!(msg.origin(), Origin::Local);
            assert_eq!(msg.kind().as_text(), Some("hello"));
        }

        #[test]
        fn rejects_empty_text() {
            let result = ConversationMessage::text(Origin::Local, "");
            assert_eq!(result.unwrap_err(), MessageError::EmptyContent);
        }

        #[test]
        fn rejects_whitespace_only_text() {
            let result = ConversationMessage::text(Origin::Remote, "   ");
            assert!(result.is_err());
        }

        #[test]
        fn image_keeps_url() {
            let msg = ConversationMessage::image(Origin::Remote, "https://x/pic.png").unwrap();
            assert_eq!(
                msg.kind(),
                &MessageKind::Image("https://x/pic.png".to_string())
            );
        }

        #[test]
        fn sets_sent_at() {
            let msg = ConversationMessage::text(Origin::Local, "hi").unwrap();
            assert!(msg.sent_at() <= Utc::now());
        }
    }

    mod origin {
        use super::*;

        #[test]
        fn local_is_local() {
            let msg = ConversationMessage::text(Origin::Local, "hi").unwrap();
            assert!(msg.is_local());
        }

        #[test]
        fn remote_is_not_local() {
            let msg = ConversationMessage::text(Origin::Remote, "hi").unwrap();
            assert!(!msg.is_local());
        }

        #[test]
        fn serializes_to_snake_case() {
            assert_eq!(serde_json::to_string(&Origin::Local).unwrap(), "\"local\"");
        }
    }

    #[test]
    fn kind_serializes_with_tag() {
        let kind = MessageKind::Text("hi".to_string());
        let json = serde_json::to_string(&kind).unwrap();
        assert!(json.contains(r#""kind":"text""#));
        assert!(json.contains(r#""content":"hi""#));
    }
}
