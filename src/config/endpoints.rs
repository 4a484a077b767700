//! Endpoint configuration
//!
//! The only external configuration point of the core: where the backend
//! lives. Everything else about the protocol is fixed.

use serde::Deserialize;

use super::error::ValidationError;

/// Realtime transports, attempted in the order configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// Low-latency duplex websocket.
    Websocket,
    /// HTTP long-poll fallback.
    LongPoll,
}

/// Backend endpoint configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EndpointsConfig {
    /// Base URL of the HTTP API (session creation, upload, long-poll).
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Websocket URL of the realtime channel namespace.
    #[serde(default = "default_channel_url")]
    pub channel_url: String,

    /// Transports to attempt, in order.
    #[serde(default = "default_transports")]
    pub transports: Vec<TransportKind>,

    /// Request timeout in seconds for one-shot HTTP calls.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Server hold time in seconds for one long-poll receive cycle.
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
}

impl EndpointsConfig {
    /// URL of the session-creation endpoint.
    pub fn create_session_url(&self) -> String {
        format!("{}/create_session", self.base_url.trim_end_matches('/'))
    }

    /// URL of the upload endpoint.
    pub fn upload_url(&self) -> String {
        format!("{}/upload", self.base_url.trim_end_matches('/'))
    }

    /// URL the long-poll transport posts outbound frames to.
    pub fn long_poll_emit_url(&self) -> String {
        format!("{}/ws/emit", self.base_url.trim_end_matches('/'))
    }

    /// URL the long-poll transport polls for inbound frames.
    pub fn long_poll_recv_url(&self) -> String {
        format!("{}/ws/poll", self.base_url.trim_end_matches('/'))
    }

    /// Validate endpoint configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ValidationError::InvalidBaseUrl);
        }
        if !self.channel_url.starts_with("ws://") && !self.channel_url.starts_with("wss://") {
            return Err(ValidationError::InvalidChannelUrl);
        }
        if self.transports.is_empty() {
            return Err(ValidationError::NoTransportConfigured);
        }
        if self.request_timeout_secs == 0 || self.request_timeout_secs > 300 {
            return Err(ValidationError::InvalidTimeout);
        }
        if self.poll_timeout_secs == 0 || self.poll_timeout_secs > 300 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            channel_url: default_channel_url(),
            transports: default_transports(),
            request_timeout_secs: default_request_timeout(),
            poll_timeout_secs: default_poll_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8888".to_string()
}

fn default_channel_url() -> String {
    "ws://localhost:8888/ws".to_string()
}

fn default_transports() -> Vec<TransportKind> {
    vec![TransportKind::Websocket, TransportKind::LongPoll]
}

fn default_request_timeout() -> u64 {
    30
}

fn default_poll_timeout() -> u64 {
    25
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_defaults() {
        let config = EndpointsConfig::default();
        assert_eq!(config.base_url, "http://localhost:8888");
        assert_eq!(config.channel_url, "ws://localhost:8888/ws");
        assert_eq!(
            config.transports,
            vec![TransportKind::Websocket, TransportKind::LongPoll]
        );
    }

    #[test]
    fn test_derived_urls_strip_trailing_slash() {
        let config = EndpointsConfig {
            base_url: "http://api.example.com/".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.create_session_url(),
            "http://api.example.com/create_session"
        );
        assert_eq!(config.upload_url(), "http://api.example.com/upload");
        assert_eq!(config.long_poll_recv_url(), "http://api.example.com/ws/poll");
    }

    #[test]
    fn test_validation_rejects_non_http_base() {
        let config = EndpointsConfig {
            base_url: "ftp://example.com".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_non_ws_channel() {
        let config = EndpointsConfig {
            channel_url: "http://example.com/ws".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_empty_transports() {
        let config = EndpointsConfig {
            transports: vec![],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_timeout() {
        let config = EndpointsConfig {
            request_timeout_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
