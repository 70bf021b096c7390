use std::sync::Arc;

use {async_trait::async_trait, tracing::error};

use {
    liaison_bridge::ReplySink,
    liaison_common::ReplyMessage,
    liaison_platform::PlatformClient,
};

/// [`ReplySink`] over the platform's reply API.
///
/// Delivery is fire-and-forget: a failed send is logged here and swallowed,
/// because the reply token is single-use and nothing upstream can retry it.
pub struct PlatformReplySink {
    client: Arc<PlatformClient>,
}

impl PlatformReplySink {
    pub fn new(client: Arc<PlatformClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ReplySink for PlatformReplySink {
    async fn send(&self, reply_token: &str, messages: &[ReplyMessage]) -> anyhow::Result<()> {
        if let Err(err) = self.client.send_reply(reply_token, messages).await {
            error!(reply_token, error = %err, "reply delivery failed");
        }
        Ok(())
    }
}
