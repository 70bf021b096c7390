//! Client for the conversational-AI broker and its identity endpoint.
//!
//! Two halves: [`client`] wraps the broker's per-bot conversation endpoint
//! (stateless, one request per call), and [`token`] owns the single shared
//! bearer credential and the serialized refresh protocol.

pub mod client;
pub mod error;
pub mod token;

pub use {
    client::{BrokerClient, BrokerSettings, ConversationApi, ConversationExchange},
    error::BrokerError,
    token::{IdentitySettings, TokenError, TokenManager, TokenSnapshot, TokenSource},
};
