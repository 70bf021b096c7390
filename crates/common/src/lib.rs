//! Shared wire types used across the liaison crates.

pub mod types;

pub use types::{EventOutcome, ReplyMessage};
