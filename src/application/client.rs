//! Activation facade wiring the production adapters to the coordinator.
//!
//! `activate` is the single composition root: it validates configuration,
//! opens the channel, kicks off session negotiation, and starts the event
//! pump. `deactivate` releases everything the activation acquired, in the
//! reverse order, and may be called at any point in the lifecycle.

use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::adapters::channel::ChannelClient;
use crate::adapters::http::{HttpSessionNegotiator, HttpUploadSidecar};
use crate::config::{AppConfig, ValidationError};
use crate::domain::{ConnectionState, Conversation, ExchangeState, SessionId, UserId};
use crate::ports::{RealtimeChannel, SessionNegotiator, UploadRequest, UploadSidecar};

use super::coordinator::Coordinator;
use super::updates::{ConversationUpdate, SendError};

/// A fully wired chat client: channel, negotiation, coordinator.
///
/// The coordinator mutex is held only for synchronous state folding; no
/// method keeps it across a network await, so the event pump and the
/// send/receive cycle stay live while a transfer or teardown is in flight.
pub struct ConfabClient {
    coordinator: Arc<Mutex<Coordinator>>,
    channel: Arc<dyn RealtimeChannel>,
    sidecar: Arc<dyn UploadSidecar>,
    negotiation: Option<JoinHandle<()>>,
    pump: Option<JoinHandle<()>>,
}

impl ConfabClient {
    /// Activates the client for the given user.
    ///
    /// Opens the channel and starts negotiation concurrently; neither
    /// blocks the other. Messaging unblocks once negotiation resolves,
    /// signalled by `SessionReady` on the returned update stream.
    ///
    /// Must be called within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the configuration is invalid; nothing
    /// is spawned in that case.
    pub fn activate(
        config: AppConfig,
        user_id: UserId,
    ) -> Result<(Self, mpsc::UnboundedReceiver<ConversationUpdate>), ValidationError> {
        config.validate()?;

        let (channel, mut events) = ChannelClient::open(&config.endpoints, config.retry.clone());
        let channel: Arc<dyn RealtimeChannel> = Arc::new(channel);
        let negotiator = HttpSessionNegotiator::new(&config.endpoints, config.retry.clone());
        let sidecar: Arc<dyn UploadSidecar> =
            Arc::new(HttpUploadSidecar::new(&config.endpoints, config.upload));

        let (coordinator, updates) =
            Coordinator::new(Arc::clone(&channel), Arc::clone(&sidecar));
        let coordinator = Arc::new(Mutex::new(coordinator));

        let negotiation = tokio::spawn({
            let coordinator = Arc::clone(&coordinator);
            async move {
                match negotiator.create_session(user_id).await {
                    Ok(session_id) => coordinator.lock().await.bind_session(session_id),
                    Err(e) => coordinator.lock().await.session_failed(&e),
                }
            }
        });

        // The pump ends when the channel's supervisor drops the stream.
        let pump = tokio::spawn({
            let coordinator = Arc::clone(&coordinator);
            async move {
                while let Some(event) = events.recv().await {
                    let mut guard = coordinator.lock().await;
                    if guard.is_closed() {
                        break;
                    }
                    guard.handle_channel_event(event);
                }
            }
        });

        Ok((
            Self {
                coordinator,
                channel,
                sidecar,
                negotiation: Some(negotiation),
                pump: Some(pump),
            },
            updates,
        ))
    }

    /// Assembles a client around caller-supplied adapters, with no
    /// negotiation or pump task running.
    #[cfg(test)]
    fn with_doubles(
        channel: Arc<dyn RealtimeChannel>,
        sidecar: Arc<dyn UploadSidecar>,
    ) -> (Self, mpsc::UnboundedReceiver<ConversationUpdate>) {
        let (coordinator, updates) =
            Coordinator::new(Arc::clone(&channel), Arc::clone(&sidecar));
        (
            Self {
                coordinator: Arc::new(Mutex::new(coordinator)),
                channel,
                sidecar,
                negotiation: None,
                pump: None,
            },
            updates,
        )
    }

    /// Dispatches a user text message.
    ///
    /// # Errors
    ///
    /// See [`SendError`]: refused before the session binds, while a reply
    /// is outstanding, for empty content, or on channel failure.
    pub async fn send_text(&self, content: impl Into<String>) -> Result<(), SendError> {
        self.coordinator.lock().await.send_text(content).await
    }

    /// Dispatches a quick-reply selection as a regular text send.
    pub async fn select_quick_reply(&self, label: impl Into<String>) -> Result<(), SendError> {
        self.coordinator.lock().await.select_quick_reply(label).await
    }

    /// Transfers a file through the upload sidecar.
    ///
    /// The transfer runs with no coordinator lock held: the exchange keeps
    /// sending and receiving while the file is on the wire, and only the
    /// completion is folded back under the lock.
    ///
    /// # Errors
    ///
    /// `SessionNotReady` before negotiation resolves; transfer failures
    /// surface on the update stream, not here.
    pub async fn upload(&self, request: UploadRequest) -> Result<(), SendError> {
        let Some(session_id) = self.coordinator.lock().await.session() else {
            return Err(SendError::SessionNotReady);
        };
        let result = self.sidecar.upload(session_id, request).await;
        self.coordinator.lock().await.handle_upload_result(result);
        Ok(())
    }

    /// Current exchange state.
    pub async fn state(&self) -> ExchangeState {
        self.coordinator.lock().await.state()
    }

    /// The bound session, once negotiation has resolved.
    pub async fn session(&self) -> Option<SessionId> {
        self.coordinator.lock().await.session()
    }

    /// Whether a reply is currently expected.
    pub async fn is_typing(&self) -> bool {
        self.coordinator.lock().await.is_typing()
    }

    /// Snapshot of the conversation so far.
    pub async fn conversation(&self) -> Conversation {
        self.coordinator.lock().await.conversation().clone()
    }

    /// Connection state of the underlying channel.
    pub fn connection_state(&self) -> ConnectionState {
        self.channel.state()
    }

    /// Deactivates the client: stops the coordinator, closes the channel,
    /// cancels an unresolved negotiation, and drains the event pump.
    /// Idempotent.
    ///
    /// The coordinator lock is released before the channel close so the
    /// pump can keep draining events while the supervisor winds down.
    pub async fn deactivate(&mut self) {
        let first_close = self.coordinator.lock().await.begin_close();
        if first_close {
            self.channel.close().await;
        }
        if let Some(handle) = self.negotiation.take() {
            handle.abort();
            let _ = handle.await;
        }
        if let Some(handle) = self.pump.take() {
            let _ = handle.await;
        }
    }
}
