use {async_trait::async_trait, liaison_common::ReplyMessage};

/// Where the bridge hands finished replies.
///
/// Fire-and-forget from the bridge's perspective: implementations log
/// delivery failures, nothing downstream retries them.
#[async_trait]
pub trait ReplySink: Send + Sync {
    async fn send(&self, reply_token: &str, messages: &[ReplyMessage]) -> anyhow::Result<()>;
}
