//! Adapters: concrete implementations of the ports.

pub mod channel;
pub mod http;
pub mod mock;
