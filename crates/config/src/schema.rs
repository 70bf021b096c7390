//! Config schema. Every field can come from a config file, a `${VAR}`
//! placeholder inside one, or a direct environment override (see
//! [`crate::loader`]).

use {secrecy::Secret, serde::Deserialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LiaisonConfig {
    pub server: ServerConfig,
    pub broker: BrokerConfig,
    pub identity: IdentityConfig,
    pub storage: StorageConfig,
    pub platform: PlatformConfig,
    pub transcription: TranscriptionConfig,
}

/// Webhook server listener.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".into(),
            port: 5000,
        }
    }
}

/// Conversational-AI broker endpoint coordinates.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// Base URL without a trailing slash.
    pub base_url: String,
    /// Organization identifier in the broker's path scheme.
    pub org: String,
    /// Environment identifier in the broker's path scheme.
    pub env: String,
    /// Bot identifier in the broker's path scheme.
    pub bot_key: String,
    pub api_key: Option<Secret<String>>,
    /// Channel tag sent with every conversation call.
    pub channel: String,
    pub locale: String,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            org: String::new(),
            env: String::new(),
            bot_key: String::new(),
            api_key: None,
            channel: "CHAT".into(),
            locale: "es-ES".into(),
        }
    }
}

/// Identity endpoint for the client-credentials grant.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub token_url: String,
    pub client_id: String,
    pub client_secret: Option<Secret<String>>,
}

/// Session storage backing service.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// sqlx connection string.
    pub database_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://liaison.db?mode=rwc".into(),
        }
    }
}

/// Messaging-platform credentials and API bases.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Messaging API base (replies), without a trailing slash.
    pub api_base: String,
    /// Content API base (media downloads), without a trailing slash.
    pub content_base: String,
    /// Webhook signing secret. Signature checks are skipped when unset.
    pub channel_secret: Option<Secret<String>>,
    pub channel_token: Option<Secret<String>>,
}

/// Speech-to-text provider. Voice messages are dropped when unconfigured.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    pub api_key: Option<Secret<String>>,
    pub api_base: Option<String>,
    pub model: Option<String>,
}
