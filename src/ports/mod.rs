//! Ports: contracts between the coordinator and the outside world.
//!
//! Each port owns its error taxonomy. Adapters implement these traits;
//! the application layer depends only on the traits, which is what makes
//! the coordinator testable against the in-tree mocks.

mod realtime_channel;
mod session_negotiator;
mod upload_sidecar;

pub use realtime_channel::{
    ChannelError, ChannelEvent, ChatPayload, OutboundEvent, RealtimeChannel, ResponseData,
    ResponseEnvelope, CODE_OK,
};
pub use session_negotiator::{SessionError, SessionNegotiator};
pub use upload_sidecar::{BeforeUpload, UploadError, UploadReceipt, UploadRequest, UploadSidecar};
