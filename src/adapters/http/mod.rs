//! HTTP adapters: session negotiation and file upload.

mod dto;
mod session;
mod upload;

pub use session::HttpSessionNegotiator;
pub use upload::{default_gate, HttpUploadSidecar};
