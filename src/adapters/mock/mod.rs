//! In-tree test doubles for the ports.
//!
//! Used by the integration and property tests to drive the coordinator
//! without a backend. Scripted, synchronous, and recording.

mod channel;
mod negotiator;
mod sidecar;

pub use channel::MockChannel;
pub use negotiator::MockSessionNegotiator;
pub use sidecar::MockUploadSidecar;
