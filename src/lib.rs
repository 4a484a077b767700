//! Confab - Session-Scoped Realtime Chat Client
//!
//! This crate bridges a user to a remote conversational backend: it
//! negotiates a session over HTTP, exchanges messages over a persistent
//! duplex channel, and correlates out-of-band file uploads to the same
//! session.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
