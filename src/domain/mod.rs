//! Domain layer: pure conversation and protocol state types.
//!
//! Nothing in this module performs I/O. The adapters translate between
//! these types and the wire; the application layer drives the transitions.

mod conversation;
mod exchange;
mod ids;
mod message;
mod state_machine;

pub use conversation::Conversation;
pub use exchange::{ConnectionState, ExchangeState};
pub use ids::{MessageId, SessionId, UserId};
pub use message::{ConversationMessage, MessageError, MessageKind, Origin};
pub use state_machine::{StateMachine, TransitionError};
