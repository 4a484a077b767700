//! Conversation aggregate.
//!
//! An append-only ordered sequence of messages. Insertion order is the
//! chronological send/receive order; messages are never reordered,
//! deduplicated, or removed.

use super::ConversationMessage;

/// The conversation owned by the coordinator and rendered by the presenter.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<ConversationMessage>,
}

impl Conversation {
    /// Creates an empty conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message at the end of the sequence.
    pub fn append(&mut self, message: ConversationMessage) {
        self.messages.push(message);
    }

    /// Returns the number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns true if no messages have been appended.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Iterates messages in append order.
    pub fn iter(&self) -> impl Iterator<Item = &ConversationMessage> {
        self.messages.iter()
    }

    /// Returns the most recently appended message.
    pub fn last(&self) -> Option<&ConversationMessage> {
        self.messages.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Origin;

    fn text(origin: Origin, content: &str) -> ConversationMessage {
        ConversationMessage::text(origin, content).unwrap()
    }

    #[test]
    fn starts_empty() {
        let convo = Conversation::new();
        assert!(convo.is_empty());
        assert_eq!(convo.len(), 0);
    }

    #[test]
    fn append_preserves_insertion_order() {
        let mut convo = Conversation::new();
        convo.append(text(Origin::Local, "first"));
        convo.append(text(Origin::Remote, "second"));
        convo.append(text(Origin::Local, "third"));

        let contents: Vec<_> = convo
            .iter()
            .filter_map(|m| m.kind().as_text())
            .collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
    }

    #[test]
    fn identical_content_is_not_deduplicated() {
        let mut convo = Conversation::new();
        convo.append(text(Origin::Local, "hello"));
        convo.append(text(Origin::Local, "hello"));
        assert_eq!(convo.len(), 2);
    }

    #[test]
    fn last_returns_newest_message() {
        let mut convo = Conversation::new();
        convo.append(text(Origin::Local, "hi"));
        convo.append(text(Origin::Remote, "there"));
        assert_eq!(convo.last().unwrap().kind().as_text(), Some("there"));
    }
}
