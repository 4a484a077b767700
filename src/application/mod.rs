//! Application layer: the exchange coordinator and the activation facade.

mod client;
mod coordinator;
mod updates;

pub use client::ConfabClient;
pub use coordinator::Coordinator;
pub use updates::{ConversationUpdate, SendError};
