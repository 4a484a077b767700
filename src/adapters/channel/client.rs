//! Channel client: ordered transport fallback, reconnection, teardown.
//!
//! One supervisor task owns the connection for the client's lifetime. It
//! tries the configured transports in order (bounded retry rounds with
//! backoff), pumps inbound frames onto the single event stream, and on
//! transport loss goes back to connecting. `close` is the release half of
//! the activation pair: it stops the supervisor, releases the pipe tasks,
//! and is idempotent.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

use crate::config::{EndpointsConfig, RetryConfig, TransportKind};
use crate::domain::ConnectionState;
use crate::ports::{ChannelError, ChannelEvent, OutboundEvent, RealtimeChannel};

use super::long_poll::LongPollTransport;
use super::transport::{Transport, TransportPipe, WebsocketTransport};
use super::wire::Frame;

/// Events buffered toward the coordinator.
const EVENT_BUFFER: usize = 64;

type OutboundSlot = Arc<StdMutex<Option<mpsc::Sender<Frame>>>>;

/// Duplex channel client implementing [`RealtimeChannel`].
pub struct ChannelClient {
    outbound: OutboundSlot,
    state_rx: watch::Receiver<ConnectionState>,
    closed: AtomicBool,
    shutdown_tx: watch::Sender<bool>,
    supervisor: Mutex<Option<JoinHandle<()>>>,
}

impl ChannelClient {
    /// Opens the channel: builds the configured transports and spawns the
    /// supervisor immediately, independent of session readiness. Returns
    /// the client and the event stream the coordinator consumes.
    pub fn open(
        endpoints: &EndpointsConfig,
        retry: RetryConfig,
    ) -> (Self, mpsc::Receiver<ChannelEvent>) {
        let transports: Vec<Box<dyn Transport>> = endpoints
            .transports
            .iter()
            .map(|kind| match kind {
                TransportKind::Websocket => Box::new(WebsocketTransport::new(
                    endpoints.channel_url.clone(),
                )) as Box<dyn Transport>,
                TransportKind::LongPoll => {
                    Box::new(LongPollTransport::new(endpoints)) as Box<dyn Transport>
                }
            })
            .collect();

        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let outbound: OutboundSlot = Arc::new(StdMutex::new(None));

        let supervisor = tokio::spawn(supervise(
            transports,
            retry,
            Duration::from_secs(endpoints.request_timeout_secs),
            Arc::clone(&outbound),
            state_tx,
            events_tx,
            shutdown_rx,
        ));

        (
            Self {
                outbound,
                state_rx,
                closed: AtomicBool::new(false),
                shutdown_tx,
                supervisor: Mutex::new(Some(supervisor)),
            },
            events_rx,
        )
    }
}

#[async_trait]
impl RealtimeChannel for ChannelClient {
    async fn emit(&self, event: OutboundEvent) -> Result<(), ChannelError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ChannelError::Closed);
        }
        let sender = self
            .outbound
            .lock()
            .expect("outbound slot poisoned")
            .clone()
            .ok_or(ChannelError::NotConnected)?;

        let frame = match event {
            OutboundEvent::Chat(payload) => Frame::Chat(payload),
        };
        sender
            .send(frame)
            .await
            .map_err(|_| ChannelError::Transport("connection lost".to_string()))
    }

    fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return; // already closed
        }
        let _ = self.shutdown_tx.send(true);
        let handle = self.supervisor.lock().await.take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}

/// How one pumping phase ended.
enum PumpEnd {
    Shutdown,
    Lost,
}

#[allow(clippy::too_many_arguments)]
async fn supervise(
    transports: Vec<Box<dyn Transport>>,
    retry: RetryConfig,
    connect_timeout: Duration,
    outbound: OutboundSlot,
    state_tx: watch::Sender<ConnectionState>,
    events: mpsc::Sender<ChannelEvent>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        // Connect phase: every round walks the transports in order.
        let _ = state_tx.send(ConnectionState::Connecting);
        let mut pipe: Option<TransportPipe> = None;
        'rounds: for round in 0..retry.max_attempts {
            if round > 0 {
                let backoff = retry.backoff_for(round - 1);
                tokio::select! {
                    _ = shutdown.changed() => {}
                    _ = sleep(backoff) => {}
                }
            }
            if *shutdown.borrow() {
                let _ = state_tx.send(ConnectionState::Disconnected);
                return;
            }
            for transport in &transports {
                match timeout(connect_timeout, transport.connect()).await {
                    Ok(Ok(connected)) => {
                        info!(transport = transport.name(), "channel connected");
                        pipe = Some(connected);
                        break 'rounds;
                    }
                    Ok(Err(e)) => {
                        warn!(transport = transport.name(), error = %e, "connect attempt failed");
                    }
                    Err(_) => {
                        warn!(transport = transport.name(), "connect attempt timed out");
                    }
                }
            }
        }

        let Some(mut pipe) = pipe else {
            let _ = state_tx.send(ConnectionState::Disconnected);
            error!("channel connect attempts exhausted");
            let _ = events
                .send(ChannelEvent::Disconnected {
                    reason: Some("connect attempts exhausted".to_string()),
                })
                .await;
            return;
        };

        *outbound.lock().expect("outbound slot poisoned") = Some(pipe.outbound.clone());
        let _ = state_tx.send(ConnectionState::Connected);
        let _ = events.send(ChannelEvent::Connected).await;

        // Pump phase: forward inbound frames until loss or shutdown.
        let end = loop {
            tokio::select! {
                _ = shutdown.changed() => break PumpEnd::Shutdown,
                frame = pipe.inbound.recv() => match frame {
                    Some(Frame::Response(envelope)) => {
                        let _ = events.send(ChannelEvent::Inbound(envelope)).await;
                    }
                    Some(Frame::Chat(_)) => {
                        debug!("ignoring chat frame pushed by backend");
                    }
                    None => break PumpEnd::Lost,
                },
            }
        };

        *outbound.lock().expect("outbound slot poisoned") = None;
        let _ = state_tx.send(ConnectionState::Disconnected);
        pipe.shutdown();

        match end {
            PumpEnd::Shutdown => return,
            PumpEnd::Lost => {
                warn!("channel transport lost, reconnecting");
                let _ = events
                    .send(ChannelEvent::Disconnected {
                        reason: Some("transport lost".to_string()),
                    })
                    .await;
                // Fall through: next lifecycle iteration reconnects.
            }
        }
    }
}
