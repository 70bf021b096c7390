//! Outbound platform client: reply delivery and media content download.

use {
    bytes::Bytes,
    reqwest::Client,
    secrecy::{ExposeSecret, Secret},
    tracing::debug,
};

use {
    crate::error::{Error, Result},
    liaison_common::ReplyMessage,
};

/// Platform API coordinates and the channel access token.
#[derive(Clone)]
pub struct PlatformSettings {
    /// Base URL of the messaging API (replies), without a trailing slash.
    pub api_base: String,
    /// Base URL of the content API (media downloads), without a trailing
    /// slash. Some platforms host this separately from the messaging API.
    pub content_base: String,
    pub channel_token: Secret<String>,
}

impl std::fmt::Debug for PlatformSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformSettings")
            .field("api_base", &self.api_base)
            .field("content_base", &self.content_base)
            .field("channel_token", &"[REDACTED]")
            .finish()
    }
}

/// A downloaded media payload.
#[derive(Debug, Clone)]
pub struct MessageContent {
    pub bytes: Bytes,
    pub content_type: Option<String>,
}

/// reqwest-backed platform client.
#[derive(Debug, Clone)]
pub struct PlatformClient {
    client: Client,
    settings: PlatformSettings,
}

impl PlatformClient {
    pub fn new(client: Client, settings: PlatformSettings) -> Self {
        Self { client, settings }
    }

    /// Deliver reply messages for one reply token.
    ///
    /// The platform consumes a reply token exactly once, so all fragments of
    /// a turn go in one call, order preserved.
    pub async fn send_reply(&self, reply_token: &str, messages: &[ReplyMessage]) -> Result<()> {
        let url = format!("{}/message/reply", self.settings.api_base);
        let response = self
            .client
            .post(&url)
            .bearer_auth(self.settings.channel_token.expose_secret())
            .json(&serde_json::json!({
                "replyToken": reply_token,
                "messages": messages,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Status {
                status: status.as_u16(),
                body,
            });
        }

        debug!(reply_token, count = messages.len(), "reply delivered");
        Ok(())
    }

    /// Download the binary content of a media message (voice notes).
    pub async fn fetch_message_content(&self, message_id: &str) -> Result<MessageContent> {
        let url = format!("{}/message/{message_id}/content", self.settings.content_base);
        let response = self
            .client
            .get(&url)
            .bearer_auth(self.settings.channel_token.expose_secret())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Status {
                status: status.as_u16(),
                body,
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);
        let bytes = response.bytes().await?;

        debug!(message_id, size = bytes.len(), "media content downloaded");
        Ok(MessageContent {
            bytes,
            content_type,
        })
    }
}
