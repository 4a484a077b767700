//! Realtime channel port.
//!
//! A persistent duplex connection to the backend's channel namespace,
//! opened at activation independent of session readiness. Connection
//! lifecycle and inbound application messages surface on a single event
//! stream consumed by the coordinator; the channel neither buffers
//! outbound events nor interprets inbound ones.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{ConnectionState, SessionId};

/// The protocol's success code, shared by every envelope.
pub const CODE_OK: u32 = 200;

/// Payload of the outbound `chat` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatPayload {
    pub content: String,
    pub content_type: String,
    pub session_id: SessionId,
}

impl ChatPayload {
    /// Builds a text chat payload for the given session.
    pub fn text(content: impl Into<String>, session_id: SessionId) -> Self {
        Self {
            content: content.into(),
            content_type: "text".to_string(),
            session_id,
        }
    }
}

/// Application events this client emits over the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundEvent {
    /// A user message bound to the current session.
    Chat(ChatPayload),
}

/// Data section of the inbound `response` envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ResponseData {
    /// Reply text, present on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,

    /// Error description, present on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Envelope of the inbound `response` event: `{code, data: {response}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub code: u32,
    #[serde(default)]
    pub data: ResponseData,
}

impl ResponseEnvelope {
    /// Returns true if the envelope carries the protocol's success code.
    pub fn is_ok(&self) -> bool {
        self.code == CODE_OK
    }

    /// Returns the reply text on a successful envelope.
    pub fn response_text(&self) -> Option<&str> {
        self.data.response.as_deref()
    }
}

/// Events surfaced by the channel adapter on its single event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// Duplex transport established (initially or after reconnect).
    Connected,

    /// Transport lost. Emitted once per loss; the adapter then attempts
    /// to reconnect on its own, emitting `Connected` again on success.
    Disconnected { reason: Option<String> },

    /// Inbound application message.
    Inbound(ResponseEnvelope),
}

/// Errors raised by the channel adapter.
#[derive(Debug, Clone, Error)]
pub enum ChannelError {
    /// `emit` was called while no transport was established. The channel
    /// does not buffer; the coordinator must not send before the channel
    /// and the session are both ready.
    #[error("channel is not connected")]
    NotConnected,

    /// The channel was closed locally; no further operations are valid.
    #[error("channel is closed")]
    Closed,

    /// No configured transport could establish a connection.
    #[error("all transports failed to connect: {0}")]
    ConnectFailed(String),

    /// Established transport failed mid-operation.
    #[error("transport failure: {0}")]
    Transport(String),
}

/// Port for the persistent duplex channel.
#[async_trait]
pub trait RealtimeChannel: Send + Sync {
    /// Transmits an application event over the established connection.
    ///
    /// # Errors
    ///
    /// - `NotConnected` if no transport is established
    /// - `Closed` after `close` has been invoked
    /// - `Transport` if the established transport fails during the send
    async fn emit(&self, event: OutboundEvent) -> Result<(), ChannelError>;

    /// Current connection state, as observed by the adapter.
    fn state(&self) -> ConnectionState;

    /// Closes the connection and releases the pump tasks.
    ///
    /// Idempotent: invoking close on an already-closed channel is a no-op.
    async fn close(&self);
}
