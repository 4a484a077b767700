//! Recording channel double.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use crate::domain::ConnectionState;
use crate::ports::{ChannelError, ChannelEvent, OutboundEvent, RealtimeChannel};

/// Channel double: records every emitted event and lets tests push
/// inbound events onto the stream the coordinator consumes.
pub struct MockChannel {
    emitted: Mutex<Vec<OutboundEvent>>,
    state: Mutex<ConnectionState>,
    closed: AtomicBool,
    close_calls: AtomicU32,
    events_tx: mpsc::Sender<ChannelEvent>,
}

impl MockChannel {
    /// Creates a channel already in the connected state.
    pub fn connected() -> (Arc<Self>, mpsc::Receiver<ChannelEvent>) {
        Self::with_state(ConnectionState::Connected)
    }

    /// Creates a channel in the given state.
    pub fn with_state(state: ConnectionState) -> (Arc<Self>, mpsc::Receiver<ChannelEvent>) {
        let (events_tx, events_rx) = mpsc::channel(64);
        (
            Arc::new(Self {
                emitted: Mutex::new(Vec::new()),
                state: Mutex::new(state),
                closed: AtomicBool::new(false),
                close_calls: AtomicU32::new(0),
                events_tx,
            }),
            events_rx,
        )
    }

    /// Pushes an event onto the coordinator's stream.
    pub fn push(&self, event: ChannelEvent) {
        self.events_tx
            .try_send(event)
            .expect("event buffer full or receiver gone");
    }

    /// Changes the simulated connection state.
    pub fn set_state(&self, state: ConnectionState) {
        *self.state.lock().expect("state poisoned") = state;
    }

    /// Everything emitted so far, in order.
    pub fn emitted(&self) -> Vec<OutboundEvent> {
        self.emitted.lock().expect("emitted poisoned").clone()
    }

    /// Number of times `close` was invoked.
    pub fn close_calls(&self) -> u32 {
        self.close_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RealtimeChannel for MockChannel {
    async fn emit(&self, event: OutboundEvent) -> Result<(), ChannelError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ChannelError::Closed);
        }
        if *self.state.lock().expect("state poisoned") != ConnectionState::Connected {
            return Err(ChannelError::NotConnected);
        }
        self.emitted.lock().expect("emitted poisoned").push(event);
        Ok(())
    }

    fn state(&self) -> ConnectionState {
        *self.state.lock().expect("state poisoned")
    }

    async fn close(&self) {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        self.closed.store(true, Ordering::SeqCst);
        self.set_state(ConnectionState::Disconnected);
    }
}
