//! Stateless wrapper around the broker's conversation endpoint.

use {
    async_trait::async_trait,
    reqwest::{Client, StatusCode},
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
    tracing::debug,
};

use crate::error::BrokerError;

/// Endpoint coordinates and caller metadata for the broker.
#[derive(Clone)]
pub struct BrokerSettings {
    /// Base URL of the broker, without a trailing slash.
    pub base_url: String,
    pub org: String,
    pub env: String,
    pub bot_key: String,
    pub api_key: Secret<String>,
    /// Channel tag sent with every call (identifies this integration).
    pub channel: String,
    /// BCP 47 locale tag for the conversation.
    pub locale: String,
}

impl std::fmt::Debug for BrokerSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrokerSettings")
            .field("base_url", &self.base_url)
            .field("org", &self.org)
            .field("env", &self.env)
            .field("bot_key", &self.bot_key)
            .field("api_key", &"[REDACTED]")
            .field("channel", &self.channel)
            .field("locale", &self.locale)
            .finish()
    }
}

/// One broker round trip, parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationExchange {
    /// The broker's current session code for this user. May differ from the
    /// one sent when the broker rotated or created the session.
    pub session_code: String,
    /// Answer fragments in delivery order.
    pub answers: Vec<String>,
}

/// The conversation surface the bridge calls. One HTTP request per call,
/// no retries at this layer.
#[async_trait]
pub trait ConversationApi: Send + Sync {
    async fn converse(
        &self,
        session_code: &str,
        user_id: &str,
        text: &str,
        token: Option<&Secret<String>>,
    ) -> Result<ConversationExchange, BrokerError>;
}

/// reqwest-backed [`ConversationApi`] implementation.
#[derive(Debug, Clone)]
pub struct BrokerClient {
    client: Client,
    settings: BrokerSettings,
}

impl BrokerClient {
    pub fn new(client: Client, settings: BrokerSettings) -> Self {
        Self { client, settings }
    }

    fn conversation_url(&self, session_code: &str) -> String {
        let s = &self.settings;
        format!(
            "{}/org/{}/env/{}/bot/{}/conversations/{session_code}",
            s.base_url, s.org, s.env, s.bot_key
        )
    }
}

#[async_trait]
impl ConversationApi for BrokerClient {
    async fn converse(
        &self,
        session_code: &str,
        user_id: &str,
        text: &str,
        token: Option<&Secret<String>>,
    ) -> Result<ConversationExchange, BrokerError> {
        let url = self.conversation_url(session_code);
        debug!(user_id, session_code, "calling broker");

        let mut request = self
            .client
            .post(&url)
            .header("API-KEY", self.settings.api_key.expose_secret())
            .header("CHANNEL", &self.settings.channel)
            .header("LOCALE", &self.settings.locale)
            .header("USER-REF", user_id)
            .json(&serde_json::json!({ "text": text }));

        if let Some(token) = token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(BrokerError::Auth);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BrokerError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ConverseResponse =
            response.json().await.map_err(|e| BrokerError::Decode {
                message: e.to_string(),
            })?;

        Ok(ConversationExchange {
            session_code: parsed.session_code,
            answers: parsed.answers.into_iter().map(|a| a.content).collect(),
        })
    }
}

// ── API Types ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConverseResponse {
    session_code: String,
    #[serde(default)]
    answers: Vec<ConverseAnswer>,
}

#[derive(Debug, Deserialize)]
struct ConverseAnswer {
    content: String,
}
