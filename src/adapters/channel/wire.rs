//! Duplex wire framing for the realtime channel.
//!
//! Frames are JSON objects tagged by event name: the client emits `chat`,
//! the backend pushes `response`. Both directions travel over whichever
//! transport is established.

use serde::{Deserialize, Serialize};

use crate::ports::{ChatPayload, ResponseEnvelope};

/// One framed event on the channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum Frame {
    /// Outbound user message.
    Chat(ChatPayload),
    /// Inbound backend reply.
    Response(ResponseEnvelope),
}

impl Frame {
    /// Encodes the frame for transmission.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decodes a received frame.
    pub fn decode(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}
