//! The session-correlation bridge: resolves a platform user to a broker
//! session, drives the authenticated conversation call with its one-shot
//! re-authentication retry, and hands the broker's answers to the reply
//! sink. This is the only component with cross-request state concerns.

pub mod bridge;
pub mod sink;

pub use {
    bridge::{Bridge, BridgeError},
    sink::ReplySink,
};
