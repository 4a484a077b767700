//! Message exchange coordinator.
//!
//! The protocol state machine: binds the negotiated session to the
//! channel, turns user intents into outbound events, and folds inbound
//! events into conversation state. All fields live on this one object,
//! constructed at activation and closed at deactivation; there is no
//! ambient state.
//!
//! Single-outstanding-send is structural here: a send while a reply is
//! outstanding is refused rather than interleaved, because the wire
//! protocol carries no correlation id to pair replies with sends.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::domain::{
    Conversation, ConversationMessage, ExchangeState, Origin, SessionId, StateMachine,
};
use crate::ports::{
    ChannelEvent, ChatPayload, OutboundEvent, RealtimeChannel, ResponseEnvelope, SessionError,
    UploadError, UploadReceipt, UploadRequest, UploadSidecar,
};

use super::updates::{ConversationUpdate, SendError};

/// The coordinator owning one conversation's exchange state.
pub struct Coordinator {
    state: ExchangeState,
    session: Option<SessionId>,
    conversation: Conversation,
    typing: bool,
    closed: bool,
    channel: Arc<dyn RealtimeChannel>,
    sidecar: Arc<dyn UploadSidecar>,
    updates: mpsc::UnboundedSender<ConversationUpdate>,
}

impl Coordinator {
    /// Creates a coordinator in `AwaitingSession` and returns the update
    /// stream the presenter renders from.
    pub fn new(
        channel: Arc<dyn RealtimeChannel>,
        sidecar: Arc<dyn UploadSidecar>,
    ) -> (Self, mpsc::UnboundedReceiver<ConversationUpdate>) {
        let (updates, updates_rx) = mpsc::unbounded_channel();
        (
            Self {
                state: ExchangeState::AwaitingSession,
                session: None,
                conversation: Conversation::new(),
                typing: false,
                closed: false,
                channel,
                sidecar,
                updates,
            },
            updates_rx,
        )
    }

    // ─────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────

    /// Current exchange state.
    pub fn state(&self) -> ExchangeState {
        self.state
    }

    /// The bound session, once negotiation has resolved.
    pub fn session(&self) -> Option<SessionId> {
        self.session
    }

    /// The conversation as rendered by the presenter.
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Whether a reply is currently expected.
    pub fn is_typing(&self) -> bool {
        self.typing
    }

    /// Whether `close` has run.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    // ─────────────────────────────────────────────────────────────────────
    // Transitions
    // ─────────────────────────────────────────────────────────────────────

    /// Binds the negotiated session: `AwaitingSession -> Idle`.
    ///
    /// A resolution arriving after `close` (the negotiation outliving the
    /// component) is discarded without mutating state.
    pub fn bind_session(&mut self, session_id: SessionId) {
        if self.closed {
            debug!(%session_id, "discarding stale session resolution");
            return;
        }
        if !self.transition(ExchangeState::Idle) {
            return;
        }
        self.session = Some(session_id);
        info!(%session_id, "session bound, messaging enabled");
        self.publish(ConversationUpdate::SessionReady(session_id));
    }

    /// Dispatches a local text send: `Idle -> AwaitingReply`.
    ///
    /// Effects, in order: append the local message, raise the typing
    /// indicator, emit the outbound `chat` event. An emit failure clears
    /// the indicator again and leaves the state in `Idle`; the appended
    /// message stays (the conversation is append-only).
    pub async fn send_text(&mut self, content: impl Into<String>) -> Result<(), SendError> {
        let Some(session_id) = self.session else {
            return Err(SendError::SessionNotReady);
        };
        if !self.state.accepts_send() {
            return Err(SendError::ReplyOutstanding);
        }

        let content = content.into();
        let message = ConversationMessage::text(Origin::Local, content.clone())?;
        self.conversation.append(message.clone());
        self.publish(ConversationUpdate::MessageAppended(message));
        self.set_typing(true);

        let payload = ChatPayload::text(content, session_id);
        if let Err(e) = self.channel.emit(OutboundEvent::Chat(payload)).await {
            warn!(error = %e, "outbound chat failed");
            self.set_typing(false);
            return Err(e.into());
        }

        self.transition(ExchangeState::AwaitingReply);
        Ok(())
    }

    /// Quick-reply selection: a text send with the reply's label.
    pub async fn select_quick_reply(&mut self, label: impl Into<String>) -> Result<(), SendError> {
        self.send_text(label).await
    }

    /// Folds one channel event into conversation state.
    pub fn handle_channel_event(&mut self, event: ChannelEvent) {
        if self.closed {
            return;
        }
        match event {
            ChannelEvent::Connected => {
                info!("channel connected");
            }
            ChannelEvent::Disconnected { reason } => {
                warn!(reason = reason.as_deref().unwrap_or("unknown"), "channel disconnected");
                if self.state == ExchangeState::AwaitingReply {
                    // The pending reply is gone with the transport; do not
                    // leave the user in a perpetual typing state.
                    self.transition(ExchangeState::Idle);
                    self.set_typing(false);
                    self.publish(ConversationUpdate::Notice(
                        "Connection lost; your last message may not have been answered."
                            .to_string(),
                    ));
                }
            }
            ChannelEvent::Inbound(envelope) => self.handle_response(envelope),
        }
    }

    /// Inbound `response`: `AwaitingReply -> Idle`, always clearing the
    /// indicator; a message is appended only on a success envelope.
    fn handle_response(&mut self, envelope: ResponseEnvelope) {
        if self.state != ExchangeState::AwaitingReply {
            warn!(code = envelope.code, "dropping unsolicited response");
            return;
        }
        self.transition(ExchangeState::Idle);
        self.set_typing(false);

        if !envelope.is_ok() {
            warn!(code = envelope.code, "reply failed, nothing appended");
            self.publish(ConversationUpdate::Notice(
                "The assistant could not answer that message.".to_string(),
            ));
            return;
        }
        let Some(text) = envelope.response_text() else {
            warn!("success envelope without response text");
            return;
        };
        match ConversationMessage::text(Origin::Remote, text) {
            Ok(message) => {
                self.conversation.append(message.clone());
                self.publish(ConversationUpdate::MessageAppended(message));
            }
            Err(e) => warn!(error = %e, "discarding empty reply"),
        }
    }

    /// Transfers a file through the sidecar, correlated to the bound
    /// session, and folds the completion back into conversation state.
    /// Does not touch the exchange state machine.
    pub async fn upload(&mut self, request: UploadRequest) -> Result<(), SendError> {
        let Some(session_id) = self.session else {
            return Err(SendError::SessionNotReady);
        };
        let result = self.sidecar.upload(session_id, request).await;
        self.handle_upload_result(result);
        Ok(())
    }

    /// Folds an upload completion: close the affordance; on success append
    /// a synthesized remote acknowledgement, on failure surface a notice.
    pub fn handle_upload_result(&mut self, result: Result<UploadReceipt, UploadError>) {
        if self.closed {
            return;
        }
        match result {
            Ok(receipt) => {
                self.publish(ConversationUpdate::UploadSettled { success: true });
                let text = format!(
                    "Received {}. You can now ask questions about this document!",
                    receipt.file_name
                );
                match ConversationMessage::text(Origin::Remote, text) {
                    Ok(message) => {
                        self.conversation.append(message.clone());
                        self.publish(ConversationUpdate::MessageAppended(message));
                    }
                    Err(e) => warn!(error = %e, "discarding upload acknowledgement"),
                }
            }
            Err(e) => {
                warn!(error = %e, "upload failed");
                self.publish(ConversationUpdate::UploadSettled { success: false });
                self.publish(ConversationUpdate::Notice("File upload failed.".to_string()));
            }
        }
    }

    /// Records a terminal negotiation failure. Messaging stays blocked in
    /// `AwaitingSession`; the user gets a notice instead of a silent hang.
    pub fn session_failed(&mut self, error: &SessionError) {
        if self.closed {
            return;
        }
        error!(%error, "session negotiation failed, messaging disabled");
        self.publish(ConversationUpdate::Notice(
            "Could not start a chat session. Please try again later.".to_string(),
        ));
    }

    /// Marks the coordinator closed: later events, binds, and updates are
    /// discarded. Returns false when already closed. Callers that hold the
    /// channel themselves close it after this returns.
    pub fn begin_close(&mut self) -> bool {
        if self.closed {
            return false;
        }
        self.closed = true;
        true
    }

    /// Deactivation: stops accepting events, then closes the channel.
    /// Idempotent on every path, including before negotiation resolves.
    pub async fn close(&mut self) {
        if self.begin_close() {
            self.channel.close().await;
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Private helpers
    // ─────────────────────────────────────────────────────────────────────

    /// Applies a validated exchange transition. A refused transition
    /// leaves the state untouched and logs; callers treat it as a no-op.
    fn transition(&mut self, target: ExchangeState) -> bool {
        match self.state.transition_to(target) {
            Ok(next) => {
                self.state = next;
                true
            }
            Err(e) => {
                warn!(error = %e, "exchange transition refused");
                false
            }
        }
    }

    fn set_typing(&mut self, typing: bool) {
        if self.typing != typing {
            self.typing = typing;
            self.publish(ConversationUpdate::TypingChanged(typing));
        }
    }

    fn publish(&self, update: ConversationUpdate) {
        // The presenter may already be gone during teardown.
        let _ = self.updates.send(update);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{MockChannel, MockUploadSidecar};
    use crate::ports::{ChannelError, ResponseData};

    fn coordinator() -> (
        Coordinator,
        mpsc::UnboundedReceiver<ConversationUpdate>,
        Arc<MockChannel>,
    ) {
        let (channel, _events) = MockChannel::connected();
        let sidecar = Arc::new(MockUploadSidecar::succeeding());
        let (coordinator, updates) =
            Coordinator::new(channel.clone() as Arc<dyn RealtimeChannel>, sidecar);
        (coordinator, updates, channel)
    }

    fn ok_response(text: &str) -> ResponseEnvelope {
        ResponseEnvelope {
            code: 200,
            data: ResponseData {
                response: Some(text.to_string()),
                error: None,
            },
        }
    }

    fn failed_response(code: u32) -> ResponseEnvelope {
        ResponseEnvelope {
            code,
            data: ResponseData::default(),
        }
    }

    mod session_binding {
        use super::*;

        #[tokio::test]
        async fn starts_awaiting_session() {
            let (coordinator, _updates, _channel) = coordinator();
            assert_eq!(coordinator.state(), ExchangeState::AwaitingSession);
            assert_eq!(coordinator.session(), None);
        }

        #[tokio::test]
        async fn bind_moves_to_idle_and_notifies_presenter() {
            let (mut coordinator, mut updates, _channel) = coordinator();
            coordinator.bind_session(SessionId::new(42));

            assert_eq!(coordinator.state(), ExchangeState::Idle);
            assert_eq!(coordinator.session(), Some(SessionId::new(42)));
            assert_eq!(
                updates.try_recv().unwrap(),
                ConversationUpdate::SessionReady(SessionId::new(42))
            );
        }

        #[tokio::test]
        async fn double_bind_is_ignored() {
            let (mut coordinator, _updates, _channel) = coordinator();
            coordinator.bind_session(SessionId::new(1));
            coordinator.bind_session(SessionId::new(2));
            assert_eq!(coordinator.session(), Some(SessionId::new(1)));
        }

        #[tokio::test]
        async fn negotiation_failure_stays_blocked_with_notice() {
            let (mut coordinator, mut updates, _channel) = coordinator();
            coordinator.session_failed(&SessionError::Timeout);

            assert_eq!(coordinator.state(), ExchangeState::AwaitingSession);
            assert!(matches!(
                updates.try_recv().unwrap(),
                ConversationUpdate::Notice(_)
            ));
            assert!(matches!(
                coordinator.send_text("hello").await,
                Err(SendError::SessionNotReady)
            ));
        }

        #[tokio::test]
        async fn stale_resolution_after_close_is_discarded() {
            let (mut coordinator, mut updates, _channel) = coordinator();
            coordinator.close().await;
            coordinator.bind_session(SessionId::new(42));

            assert_eq!(coordinator.session(), None);
            assert!(updates.try_recv().is_err());
        }
    }

    mod sending {
        use super::*;

        #[tokio::test]
        async fn send_before_session_is_rejected_and_emits_nothing() {
            let (mut coordinator, _updates, channel) = coordinator();
            let result = coordinator.send_text("hello").await;

            assert!(matches!(result, Err(SendError::SessionNotReady)));
            assert!(channel.emitted().is_empty());
            assert!(coordinator.conversation().is_empty());
        }

        #[tokio::test]
        async fn send_appends_sets_typing_and_emits_in_order() {
            let (mut coordinator, mut updates, channel) = coordinator();
            coordinator.bind_session(SessionId::new(7));
            coordinator.send_text("hello").await.unwrap();

            assert_eq!(coordinator.state(), ExchangeState::AwaitingReply);
            assert!(coordinator.is_typing());
            assert_eq!(
                channel.emitted(),
                vec![OutboundEvent::Chat(ChatPayload::text(
                    "hello",
                    SessionId::new(7)
                ))]
            );

            // SessionReady, then the local append, then typing=true.
            assert!(matches!(
                updates.try_recv().unwrap(),
                ConversationUpdate::SessionReady(_)
            ));
            match updates.try_recv().unwrap() {
                ConversationUpdate::MessageAppended(message) => {
                    assert_eq!(message.origin(), Origin::Local);
                    assert_eq!(message.kind().as_text(), Some("hello"));
                }
                other => panic!("expected append, got {:?}", other),
            }
            assert_eq!(
                updates.try_recv().unwrap(),
                ConversationUpdate::TypingChanged(true)
            );
        }

        #[tokio::test]
        async fn second_send_while_awaiting_reply_is_rejected() {
            let (mut coordinator, _updates, channel) = coordinator();
            coordinator.bind_session(SessionId::new(7));
            coordinator.send_text("first").await.unwrap();

            let result = coordinator.send_text("second").await;
            assert!(matches!(result, Err(SendError::ReplyOutstanding)));
            assert_eq!(channel.emitted().len(), 1);
        }

        #[tokio::test]
        async fn empty_send_is_rejected() {
            let (mut coordinator, _updates, _channel) = coordinator();
            coordinator.bind_session(SessionId::new(7));
            let result = coordinator.send_text("   ").await;
            assert!(matches!(result, Err(SendError::InvalidMessage(_))));
            assert_eq!(coordinator.state(), ExchangeState::Idle);
        }

        #[tokio::test]
        async fn quick_reply_takes_the_send_path() {
            let (mut coordinator, _updates, channel) = coordinator();
            coordinator.bind_session(SessionId::new(7));
            coordinator.select_quick_reply("Tell me more").await.unwrap();

            assert_eq!(
                channel.emitted(),
                vec![OutboundEvent::Chat(ChatPayload::text(
                    "Tell me more",
                    SessionId::new(7)
                ))]
            );
        }

        #[tokio::test]
        async fn emit_failure_clears_typing_and_stays_idle() {
            let (channel, _events) =
                MockChannel::with_state(crate::domain::ConnectionState::Disconnected);
            let sidecar = Arc::new(MockUploadSidecar::succeeding());
            let (mut coordinator, _updates) =
                Coordinator::new(channel as Arc<dyn RealtimeChannel>, sidecar);
            coordinator.bind_session(SessionId::new(7));

            let result = coordinator.send_text("hello").await;
            assert!(matches!(
                result,
                Err(SendError::Channel(ChannelError::NotConnected))
            ));
            assert!(!coordinator.is_typing());
            assert_eq!(coordinator.state(), ExchangeState::Idle);
            // The local message stays; the conversation is append-only.
            assert_eq!(coordinator.conversation().len(), 1);
        }
    }

    mod receiving {
        use super::*;

        #[tokio::test]
        async fn ok_response_appends_remote_and_clears_typing() {
            let (mut coordinator, _updates, _channel) = coordinator();
            coordinator.bind_session(SessionId::new(7));
            coordinator.send_text("hello").await.unwrap();

            coordinator.handle_channel_event(ChannelEvent::Inbound(ok_response("hi there")));

            assert_eq!(coordinator.state(), ExchangeState::Idle);
            assert!(!coordinator.is_typing());
            assert_eq!(coordinator.conversation().len(), 2);
            let last = coordinator.conversation().last().unwrap();
            assert_eq!(last.origin(), Origin::Remote);
            assert_eq!(last.kind().as_text(), Some("hi there"));
        }

        #[tokio::test]
        async fn failed_response_clears_typing_without_append() {
            let (mut coordinator, _updates, _channel) = coordinator();
            coordinator.bind_session(SessionId::new(7));
            coordinator.send_text("hello").await.unwrap();

            coordinator.handle_channel_event(ChannelEvent::Inbound(failed_response(400)));

            assert_eq!(coordinator.state(), ExchangeState::Idle);
            assert!(!coordinator.is_typing());
            assert_eq!(coordinator.conversation().len(), 1);
        }

        #[tokio::test]
        async fn response_before_session_is_dropped() {
            let (mut coordinator, _updates, _channel) = coordinator();

            coordinator.handle_channel_event(ChannelEvent::Inbound(ok_response("early")));

            // Still blocked: the reply must not fake a session bind.
            assert_eq!(coordinator.state(), ExchangeState::AwaitingSession);
            assert!(coordinator.conversation().is_empty());
            assert!(matches!(
                coordinator.send_text("hello").await,
                Err(SendError::SessionNotReady)
            ));
        }

        #[tokio::test]
        async fn unsolicited_response_is_dropped() {
            let (mut coordinator, _updates, _channel) = coordinator();
            coordinator.bind_session(SessionId::new(7));

            coordinator.handle_channel_event(ChannelEvent::Inbound(ok_response("surprise")));

            assert!(coordinator.conversation().is_empty());
            assert_eq!(coordinator.state(), ExchangeState::Idle);
        }

        #[tokio::test]
        async fn disconnect_while_awaiting_reply_clears_typing() {
            let (mut coordinator, mut updates, _channel) = coordinator();
            coordinator.bind_session(SessionId::new(7));
            coordinator.send_text("hello").await.unwrap();

            coordinator.handle_channel_event(ChannelEvent::Disconnected {
                reason: Some("transport lost".to_string()),
            });

            assert!(!coordinator.is_typing());
            assert_eq!(coordinator.state(), ExchangeState::Idle);
            // Drain to the notice.
            let mut saw_notice = false;
            while let Ok(update) = updates.try_recv() {
                if matches!(update, ConversationUpdate::Notice(_)) {
                    saw_notice = true;
                }
            }
            assert!(saw_notice);
        }

        #[tokio::test]
        async fn connect_event_does_not_mutate_state() {
            let (mut coordinator, _updates, _channel) = coordinator();
            coordinator.bind_session(SessionId::new(7));
            coordinator.handle_channel_event(ChannelEvent::Connected);
            assert_eq!(coordinator.state(), ExchangeState::Idle);
        }
    }

    mod uploading {
        use super::*;

        #[tokio::test]
        async fn upload_before_session_is_rejected() {
            let (mut coordinator, _updates, _channel) = coordinator();
            let request = UploadRequest::new("doc.pdf", "application/pdf", vec![1]);
            let result = coordinator.upload(request).await;
            assert!(matches!(result, Err(SendError::SessionNotReady)));
        }

        #[tokio::test]
        async fn successful_upload_appends_acknowledgement() {
            let (mut coordinator, mut updates, _channel) = coordinator();
            coordinator.bind_session(SessionId::new(7));
            let request = UploadRequest::new("doc.pdf", "application/pdf", vec![1]);
            coordinator.upload(request).await.unwrap();

            assert_eq!(coordinator.conversation().len(), 1);
            let last = coordinator.conversation().last().unwrap();
            assert_eq!(last.origin(), Origin::Remote);
            assert!(last.kind().as_text().unwrap().contains("doc.pdf"));

            let mut saw_settled = false;
            while let Ok(update) = updates.try_recv() {
                if update == (ConversationUpdate::UploadSettled { success: true }) {
                    saw_settled = true;
                }
            }
            assert!(saw_settled);
        }

        #[tokio::test]
        async fn failed_upload_leaves_conversation_untouched() {
            let (channel, _events) = MockChannel::connected();
            let sidecar = Arc::new(MockUploadSidecar::failing(UploadError::Rejected {
                code: 500,
            }));
            let (mut coordinator, mut updates) =
                Coordinator::new(channel as Arc<dyn RealtimeChannel>, sidecar);
            coordinator.bind_session(SessionId::new(7));

            let request = UploadRequest::new("doc.pdf", "application/pdf", vec![1]);
            coordinator.upload(request).await.unwrap();

            assert!(coordinator.conversation().is_empty());
            let mut saw_failure_notice = false;
            while let Ok(update) = updates.try_recv() {
                if matches!(update, ConversationUpdate::Notice(_)) {
                    saw_failure_notice = true;
                }
            }
            assert!(saw_failure_notice);
        }
    }

    mod teardown {
        use super::*;

        #[tokio::test]
        async fn close_closes_the_channel_once_per_call() {
            let (mut coordinator, _updates, channel) = coordinator();
            coordinator.close().await;
            coordinator.close().await;
            // Idempotent: the second close never reaches the channel.
            assert_eq!(channel.close_calls(), 1);
            assert!(coordinator.is_closed());
        }

        #[tokio::test]
        async fn events_after_close_are_ignored() {
            let (mut coordinator, _updates, _channel) = coordinator();
            coordinator.bind_session(SessionId::new(7));
            coordinator.close().await;

            coordinator.handle_channel_event(ChannelEvent::Inbound(ok_response("late")));
            assert!(coordinator.conversation().is_empty());
        }
    }
}
