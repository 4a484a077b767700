//! Realtime channel adapters: wire framing, transports, and the
//! supervising client.

mod client;
mod long_poll;
mod transport;
mod wire;

pub use client::ChannelClient;
pub use long_poll::LongPollTransport;
pub use transport::{Transport, TransportPipe, WebsocketTransport};
pub use wire::Frame;
