use std::sync::Arc;

use secrecy::Secret;

use {
    liaison_bridge::{Bridge, ReplySink},
    liaison_platform::PlatformClient,
    liaison_voice::SttProvider,
};

/// Everything a webhook request needs, cloned per request by axum.
#[derive(Clone)]
pub struct AppState {
    pub bridge: Arc<Bridge>,
    pub platform: Arc<PlatformClient>,
    /// Same sink the bridge delivers through; the dispatcher uses it for
    /// canned replies that never reach the broker.
    pub replies: Arc<dyn ReplySink>,
    /// Unset means voice messages are dropped.
    pub stt: Option<Arc<dyn SttProvider>>,
    /// Unset means webhook signatures are not checked.
    pub channel_secret: Option<Secret<String>>,
}
