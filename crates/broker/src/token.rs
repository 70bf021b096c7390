//! The process-wide bearer credential for the broker.
//!
//! Validity is discovered reactively: a broker call fails with 401 and the
//! caller asks for a refresh. Because every concurrently handled event
//! shares this one credential, refreshes are serialized: the state lock is
//! held across the identity call, and a caller whose observed generation has
//! already been superseded gets the existing token back instead of issuing
//! a duplicate identity-endpoint call.

use {
    async_trait::async_trait,
    reqwest::Client,
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
    tokio::sync::Mutex,
    tracing::{debug, warn},
};

use thiserror::Error;

/// Identity-endpoint coordinates for the client-credentials grant.
#[derive(Clone)]
pub struct IdentitySettings {
    pub token_url: String,
    pub client_id: String,
    pub client_secret: Secret<String>,
}

impl std::fmt::Debug for IdentitySettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentitySettings")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    #[error("identity endpoint returned {status}: {body}")]
    Denied { status: u16, body: String },

    #[error("malformed token response: {message}")]
    Decode { message: String },
}

/// A point-in-time view of the shared credential.
///
/// `generation` increases by one on every successful refresh; callers hand
/// it back to [`TokenSource::refresh`] so the manager can tell a stale
/// complaint from a fresh one.
#[derive(Clone, Debug)]
pub struct TokenSnapshot {
    pub token: Option<Secret<String>>,
    pub generation: u64,
}

/// Read/refresh surface the bridge depends on.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn snapshot(&self) -> TokenSnapshot;

    /// Replace the credential the caller found stale. `seen` is the
    /// generation of the snapshot whose token the broker rejected; if the
    /// credential has already moved past it, no identity call is made.
    async fn refresh(&self, seen: u64) -> Result<TokenSnapshot, TokenError>;
}

struct TokenState {
    token: Option<Secret<String>>,
    generation: u64,
}

/// Owns the one live credential and mints replacements from the identity
/// endpoint.
pub struct TokenManager {
    client: Client,
    settings: IdentitySettings,
    state: Mutex<TokenState>,
}

impl TokenManager {
    pub fn new(client: Client, settings: IdentitySettings) -> Self {
        Self {
            client,
            settings,
            state: Mutex::new(TokenState {
                token: None,
                generation: 0,
            }),
        }
    }

    /// One form-encoded client-credentials exchange. Never retries.
    async fn authenticate(&self) -> Result<Secret<String>, TokenError> {
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.settings.client_id.as_str()),
            ("client_secret", self.settings.client_secret.expose_secret()),
        ];

        let response = self
            .client
            .post(&self.settings.token_url)
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "identity endpoint refused the grant");
            return Err(TokenError::Denied {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: TokenResponse = response.json().await.map_err(|e| TokenError::Decode {
            message: e.to_string(),
        })?;

        Ok(Secret::new(parsed.access_token))
    }
}

#[async_trait]
impl TokenSource for TokenManager {
    async fn snapshot(&self) -> TokenSnapshot {
        let state = self.state.lock().await;
        TokenSnapshot {
            token: state.token.clone(),
            generation: state.generation,
        }
    }

    async fn refresh(&self, seen: u64) -> Result<TokenSnapshot, TokenError> {
        // The lock is held across the identity call: concurrent refreshers
        // queue here and, once the first one lands, find their `seen`
        // generation superseded and take the coalesced result.
        let mut state = self.state.lock().await;

        if state.generation > seen && state.token.is_some() {
            debug!(
                generation = state.generation,
                "credential already refreshed by a concurrent handler"
            );
            return Ok(TokenSnapshot {
                token: state.token.clone(),
                generation: state.generation,
            });
        }

        let token = self.authenticate().await?;
        state.token = Some(token);
        state.generation += 1;
        debug!(generation = state.generation, "bearer credential replaced");

        Ok(TokenSnapshot {
            token: state.token.clone(),
            generation: state.generation,
        })
    }
}

// ── API Types ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn manager(server: &mockito::Server) -> TokenManager {
        TokenManager::new(
            Client::new(),
            IdentitySettings {
                token_url: format!("{}/oauth/token", server.url()),
                client_id: "client-1".into(),
                client_secret: Secret::new("hunter2".into()),
            },
        )
    }

    fn token_body(token: &str) -> String {
        serde_json::json!({ "access_token": token, "token_type": "Bearer" }).to_string()
    }

    #[test]
    fn test_debug_redacts_client_secret() {
        let settings = IdentitySettings {
            token_url: "http://idp.local/token".into(),
            client_id: "client-1".into(),
            client_secret: Secret::new("hunter2".into()),
        };
        let debug_output = format!("{settings:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("hunter2"));
    }

    #[tokio::test]
    async fn test_starts_unauthenticated() {
        let server = mockito::Server::new_async().await;
        let snapshot = manager(&server).snapshot().await;
        assert!(snapshot.token.is_none());
        assert_eq!(snapshot.generation, 0);
    }

    #[tokio::test]
    async fn test_refresh_sends_client_credentials_form() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/oauth/token")
            .match_header("content-type", "application/x-www-form-urlencoded")
            .match_body(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("grant_type".into(), "client_credentials".into()),
                mockito::Matcher::UrlEncoded("client_id".into(), "client-1".into()),
                mockito::Matcher::UrlEncoded("client_secret".into(), "hunter2".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(token_body("tok-1"))
            .create_async()
            .await;

        let snapshot = manager(&server).refresh(0).await.unwrap();
        assert_eq!(
            snapshot.token.as_ref().map(|t| t.expose_secret().as_str()),
            Some("tok-1")
        );
        assert_eq!(snapshot.generation, 1);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_concurrent_refreshes_coalesce_to_one_identity_call() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/oauth/token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(token_body("tok-1"))
            .expect(1)
            .create_async()
            .await;

        let manager = manager(&server);
        // Both handlers saw generation 0 fail before either refresh ran.
        let (a, b) = tokio::join!(manager.refresh(0), manager.refresh(0));
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_eq!(a.generation, 1);
        assert_eq!(b.generation, 1);
        assert_eq!(
            a.token.unwrap().expose_secret(),
            b.token.unwrap().expose_secret()
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_genuinely_stale_token_is_replaced() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/oauth/token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(token_body("tok"))
            .expect(2)
            .create_async()
            .await;

        let manager = manager(&server);
        let first = manager.refresh(0).await.unwrap();
        // The broker rejected tok at generation 1, so a real refresh follows.
        let second = manager.refresh(first.generation).await.unwrap();

        assert_eq!(second.generation, 2);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_denied_grant_leaves_credential_untouched() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/oauth/token")
            .with_status(500)
            .with_body("idp down")
            .create_async()
            .await;

        let manager = manager(&server);
        let err = manager.refresh(0).await.unwrap_err();
        assert!(matches!(err, TokenError::Denied { status: 500, .. }));

        let snapshot = manager.snapshot().await;
        assert!(snapshot.token.is_none());
        assert_eq!(snapshot.generation, 0);
    }

    #[tokio::test]
    async fn test_missing_access_token_is_a_decode_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/oauth/token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"token_type":"Bearer"}"#)
            .create_async()
            .await;

        let err = manager(&server).refresh(0).await.unwrap_err();
        assert!(matches!(err, TokenError::Decode { .. }));
    }
}
