//! Durable platform-user → broker-session correlation storage.

pub mod directory;
pub mod error;

pub use {
    directory::{SessionDirectory, SessionMapping, SqliteSessionDirectory},
    error::{Error, Result},
};
