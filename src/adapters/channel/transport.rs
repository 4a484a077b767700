//! Transport seam and the primary websocket transport.
//!
//! A transport turns a configured endpoint into a connected duplex pipe of
//! [`Frame`]s. The channel client tries transports in configured order and
//! treats the pipe uniformly afterwards: outbound frames go into a sender,
//! inbound frames arrive on a receiver, and the receiver ending means the
//! connection is gone.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite;
use tracing::{debug, warn};

use crate::ports::ChannelError;

use super::wire::Frame;

/// Frames buffered toward the backend before emit applies backpressure.
const OUTBOUND_BUFFER: usize = 32;

/// A connected duplex pipe.
///
/// Dropping the `outbound` sender and the pipe's tasks tears the
/// connection down; [`TransportPipe::shutdown`] does both explicitly.
pub struct TransportPipe {
    /// Frames to transmit.
    pub outbound: mpsc::Sender<Frame>,
    /// Frames received. `None` from `recv` means the transport was lost.
    pub inbound: mpsc::Receiver<Frame>,
    tasks: Vec<JoinHandle<()>>,
}

impl TransportPipe {
    /// Assembles a pipe from its halves and the pump tasks that serve them.
    pub fn new(
        outbound: mpsc::Sender<Frame>,
        inbound: mpsc::Receiver<Frame>,
        tasks: Vec<JoinHandle<()>>,
    ) -> Self {
        Self {
            outbound,
            inbound,
            tasks,
        }
    }

    /// Releases the pump tasks. Safe to call on an already-dead pipe.
    pub fn shutdown(self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// A way of establishing the duplex connection.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Transport name for logs.
    fn name(&self) -> &'static str;

    /// Attempts to connect, returning a live pipe on success.
    async fn connect(&self) -> Result<TransportPipe, ChannelError>;
}

/// The primary low-latency transport: a websocket against the channel
/// namespace URL.
pub struct WebsocketTransport {
    url: String,
}

impl WebsocketTransport {
    /// Creates a transport for the given `ws://` / `wss://` URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl Transport for WebsocketTransport {
    fn name(&self) -> &'static str {
        "websocket"
    }

    async fn connect(&self) -> Result<TransportPipe, ChannelError> {
        let (stream, _) = tokio_tungstenite::connect_async(&self.url)
            .await
            .map_err(|e| ChannelError::ConnectFailed(e.to_string()))?;
        let (mut ws_write, mut ws_read) = stream.split();

        let (outbound_tx, mut outbound_rx) = mpsc::channel::<Frame>(OUTBOUND_BUFFER);
        let (inbound_tx, inbound_rx) = mpsc::channel::<Frame>(OUTBOUND_BUFFER);

        // Writer: drain outbound frames onto the socket. Ends when the
        // sender side is dropped or the socket refuses a write.
        let writer = tokio::spawn(async move {
            while let Some(frame) = outbound_rx.recv().await {
                let text = match frame.encode() {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(error = %e, "dropping unencodable frame");
                        continue;
                    }
                };
                if let Err(e) = ws_write.send(tungstenite::Message::Text(text)).await {
                    warn!(error = %e, "websocket write failed");
                    break;
                }
            }
            let _ = ws_write.close().await;
        });

        // Reader: forward frames until the socket closes. Dropping
        // inbound_tx is what signals the loss upstream.
        let reader = tokio::spawn(async move {
            while let Some(message) = ws_read.next().await {
                match message {
                    Ok(tungstenite::Message::Text(text)) => match Frame::decode(&text) {
                        Ok(frame) => {
                            if inbound_tx.send(frame).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!(error = %e, "dropping undecodable frame"),
                    },
                    Ok(tungstenite::Message::Close(_)) => break,
                    Ok(_) => {} // ping/pong/binary: nothing to forward
                    Err(e) => {
                        debug!(error = %e, "websocket read failed");
                        break;
                    }
                }
            }
        });

        Ok(TransportPipe::new(
            outbound_tx,
            inbound_rx,
            vec![writer, reader],
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_is_object_safe() {
        fn _accepts_dyn(_transport: &dyn Transport) {}
    }

    #[tokio::test]
    async fn connect_to_unreachable_host_fails() {
        let transport = WebsocketTransport::new("ws://127.0.0.1:9");
        let result = transport.connect().await;
        assert!(matches!(result, Err(ChannelError::ConnectFailed(_))));
    }

    #[tokio::test]
    async fn pipe_shutdown_aborts_tasks() {
        let (out_tx, _out_rx) = mpsc::channel(1);
        let (_in_tx, in_rx) = mpsc::channel::<Frame>(1);
        let task = tokio::spawn(async {
            std::future::pending::<()>().await;
        });
        let pipe = TransportPipe::new(out_tx, in_rx, vec![task]);
        pipe.shutdown();
    }
}
