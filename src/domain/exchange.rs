//! Exchange and connection state machines.
//!
//! `ExchangeState` is the coordinator's protocol state: it gates sending
//! until a session exists and models at most one outstanding send.
//! `ConnectionState` is the channel adapter's view of the transport.

use serde::{Deserialize, Serialize};

use super::StateMachine;

/// The lifecycle state of the message exchange.
///
/// - `AwaitingSession`: negotiation has not resolved; all sends rejected
/// - `Idle`: session bound, no reply outstanding, sends permitted
/// - `AwaitingReply`: a local send was dispatched; further sends rejected
///   until the reply (of any status) arrives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeState {
    /// No session yet; messaging is blocked.
    #[default]
    AwaitingSession,

    /// Session bound, ready to send.
    Idle,

    /// Outbound message dispatched, reply expected.
    AwaitingReply,
}

impl ExchangeState {
    /// Returns true if a local send intent may be dispatched in this state.
    pub fn accepts_send(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Returns true if a session identifier has been bound.
    pub fn has_session(&self) -> bool {
        !matches!(self, Self::AwaitingSession)
    }
}

impl StateMachine for ExchangeState {
    fn can_transition_to(&self, target: &Self) -> bool {
        use ExchangeState::*;
        matches!(
            (self, target),
            // Negotiation resolved
            (AwaitingSession, Idle) |
            // Local send dispatched
            (Idle, AwaitingReply) |
            // Reply received (any status) or channel lost mid-flight
            (AwaitingReply, Idle)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use ExchangeState::*;
        match self {
            AwaitingSession => vec![Idle],
            Idle => vec![AwaitingReply],
            AwaitingReply => vec![Idle],
        }
    }
}

/// The channel adapter's transport connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No transport established.
    #[default]
    Disconnected,

    /// A connect attempt (possibly a fallback) is in flight.
    Connecting,

    /// Duplex transport established.
    Connected,
}

impl StateMachine for ConnectionState {
    fn can_transition_to(&self, target: &Self) -> bool {
        use ConnectionState::*;
        matches!(
            (self, target),
            (Disconnected, Connecting)
                | (Connecting, Connected)
                | (Connecting, Disconnected)
                | (Connected, Disconnected)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use ConnectionState::*;
        match self {
            Disconnected => vec![Connecting],
            Connecting => vec![Connected, Disconnected],
            Connected => vec![Disconnected],
        }
    }
}
