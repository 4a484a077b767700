//! HTTP long-poll fallback transport.
//!
//! Used when the websocket cannot be established. Outbound frames are
//! POSTed one at a time to the emit endpoint; inbound frames are fetched
//! by repeatedly POSTing to the poll endpoint, which holds the request
//! until frames are available or its hold time elapses and replies with a
//! (possibly empty) JSON array of frames. A per-connection client id ties
//! the two directions together on the backend.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::EndpointsConfig;
use crate::ports::ChannelError;

use super::transport::{Transport, TransportPipe};
use super::wire::Frame;

const OUTBOUND_BUFFER: usize = 32;

/// Long-poll implementation of [`Transport`].
pub struct LongPollTransport {
    client: Client,
    emit_url: String,
    recv_url: String,
    poll_timeout: Duration,
}

impl LongPollTransport {
    /// Creates a transport for the configured endpoints.
    pub fn new(endpoints: &EndpointsConfig) -> Self {
        // The poll request is held server-side, so its client timeout must
        // exceed the configured hold time.
        let client = Client::builder()
            .timeout(Duration::from_secs(endpoints.poll_timeout_secs + 5))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            emit_url: endpoints.long_poll_emit_url(),
            recv_url: endpoints.long_poll_recv_url(),
            poll_timeout: Duration::from_secs(endpoints.poll_timeout_secs),
        }
    }

    fn with_client_id(url: &str, client_id: &Uuid) -> String {
        format!("{}?client={}", url, client_id)
    }
}

#[async_trait]
impl Transport for LongPollTransport {
    fn name(&self) -> &'static str {
        "long-poll"
    }

    async fn connect(&self) -> Result<TransportPipe, ChannelError> {
        let client_id = Uuid::new_v4();
        let emit_url = Self::with_client_id(&self.emit_url, &client_id);
        let recv_url = Self::with_client_id(&self.recv_url, &client_id);

        // Probe the poll endpoint once so fallback ordering sees an
        // immediate failure when the backend is unreachable.
        let probe = self
            .client
            .post(&recv_url)
            .query(&[("hold", "0")])
            .send()
            .await
            .map_err(|e| ChannelError::ConnectFailed(e.to_string()))?;
        if !probe.status().is_success() {
            return Err(ChannelError::ConnectFailed(format!(
                "poll endpoint answered {}",
                probe.status()
            )));
        }

        let (outbound_tx, mut outbound_rx) = mpsc::channel::<Frame>(OUTBOUND_BUFFER);
        let (inbound_tx, inbound_rx) = mpsc::channel::<Frame>(OUTBOUND_BUFFER);

        // Writer: one POST per outbound frame.
        let writer_client = self.client.clone();
        let writer = tokio::spawn(async move {
            while let Some(frame) = outbound_rx.recv().await {
                let sent = writer_client.post(&emit_url).json(&frame).send().await;
                match sent {
                    Ok(response) if response.status().is_success() => {}
                    Ok(response) => {
                        warn!(status = %response.status(), "long-poll emit rejected");
                        break;
                    }
                    Err(e) => {
                        warn!(error = %e, "long-poll emit failed");
                        break;
                    }
                }
            }
        });

        // Reader: poll until the endpoint errors or the pipe is dropped.
        let reader_client = self.client.clone();
        let hold_secs = self.poll_timeout.as_secs().to_string();
        let reader = tokio::spawn(async move {
            loop {
                let polled = reader_client
                    .post(&recv_url)
                    .query(&[("hold", hold_secs.as_str())])
                    .send()
                    .await;
                let response = match polled {
                    Ok(response) if response.status().is_success() => response,
                    Ok(response) => {
                        debug!(status = %response.status(), "long-poll recv rejected");
                        break;
                    }
                    Err(e) => {
                        debug!(error = %e, "long-poll recv failed");
                        break;
                    }
                };
                let frames: Vec<Frame> = match response.json().await {
                    Ok(frames) => frames,
                    Err(e) => {
                        warn!(error = %e, "dropping undecodable poll batch");
                        continue;
                    }
                };
                for frame in frames {
                    if inbound_tx.send(frame).await.is_err() {
                        return;
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
    fn urls_carry_the_client_id() {
        let id = Uuid::new_v4();
        let url = LongPollTransport::with_client_id("http://x/ws/poll", &id);
        assert_eq!(url, format!("http://x/ws/poll?client={}", id));
    }

    #[tokio::test]
    async fn connect_to_unreachable_host_fails() {
        let endpoints = EndpointsConfig {
            base_url: "http://192.0.2.1:1".to_string(),
            request_timeout_secs: 1,
            poll_timeout_secs: 1,
            ..Default::default()
        };
        let transport = LongPollTransport::new(&endpoints);
        let result = transport.connect().await;
        assert!(matches!(result, Err(ChannelError::ConnectFailed(_))));
    }
}
