//! The webhook gateway: accepts platform event batches over HTTP,
//! dispatches each event to the bridge, and answers with per-event results.

pub mod dispatch;
pub mod reply;
pub mod server;
pub mod state;
pub mod webhook;

pub use {
    reply::PlatformReplySink,
    server::{build_app, serve},
    state::AppState,
};
