//! Messaging-platform integration: inbound event wire types, webhook
//! signature verification, and the outbound client for replies and media
//! content downloads.

pub mod client;
pub mod error;
pub mod events;
pub mod signature;

pub use {
    client::{MessageContent, PlatformClient, PlatformSettings},
    error::{Error, Result},
    events::{EventSource, InboundEvent, MessagePayload, PostbackPayload, WebhookEnvelope},
    signature::verify_signature,
};
