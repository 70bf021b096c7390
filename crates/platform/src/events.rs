//! Inbound webhook wire types, as the platform serialises them.

use serde::Deserialize;

/// Top-level webhook body: one batch of chat events.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEnvelope {
    #[serde(default)]
    pub events: Vec<InboundEvent>,
}

/// One chat event. Fields beyond `type` are present depending on the kind;
/// everything is optional here and validated by the dispatcher.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundEvent {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub source: Option<EventSource>,
    #[serde(default)]
    pub message: Option<MessagePayload>,
    #[serde(default)]
    pub postback: Option<PostbackPayload>,
    #[serde(rename = "replyToken", default)]
    pub reply_token: Option<String>,
}

impl InboundEvent {
    /// The stable platform user id, when the event carries one.
    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.source.as_ref()?.user_id.as_deref()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventSource {
    #[serde(rename = "userId", default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessagePayload {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostbackPayload {
    #[serde(default)]
    pub data: String,
}
