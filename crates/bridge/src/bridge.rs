//! One inbound message, end to end: `Resolving → Conversing →
//! {Delivering | AuthRetrying → Conversing | Failed}`, with `AuthRetrying`
//! reachable at most once per invocation.

use std::sync::Arc;

use {
    thiserror::Error,
    tracing::{error, info, warn},
};

use {
    liaison_broker::{
        BrokerError, ConversationApi, ConversationExchange, TokenError, TokenSource,
    },
    liaison_common::{EventOutcome, ReplyMessage},
    liaison_sessions::SessionDirectory,
};

use crate::sink::ReplySink;

/// Upper bound on broker calls per event: the original attempt plus one
/// retry after a credential refresh. Never more, even if the identity
/// endpoint keeps minting tokens the broker rejects.
const MAX_CONVERSE_ATTEMPTS: u32 = 2;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("credential refresh failed: {0}")]
    Refresh(#[source] TokenError),

    #[error(transparent)]
    Broker(#[from] BrokerError),
}

/// Orchestrator tying session resolution, authentication, and broker
/// invocation together for one inbound message.
pub struct Bridge {
    directory: Arc<dyn SessionDirectory>,
    broker: Arc<dyn ConversationApi>,
    tokens: Arc<dyn TokenSource>,
    replies: Arc<dyn ReplySink>,
}

impl Bridge {
    pub fn new(
        directory: Arc<dyn SessionDirectory>,
        broker: Arc<dyn ConversationApi>,
        tokens: Arc<dyn TokenSource>,
        replies: Arc<dyn ReplySink>,
    ) -> Self {
        Self {
            directory,
            broker,
            tokens,
            replies,
        }
    }

    /// Process one text turn for one user.
    ///
    /// Never propagates an error: every failure inside is logged and folded
    /// into the returned [`EventOutcome`], so a bad event can neither crash
    /// the process nor take down its batch siblings.
    pub async fn handle(&self, user_id: &str, text: &str, reply_token: &str) -> EventOutcome {
        let exchange = match self.converse_correlated(user_id, text).await {
            Ok(exchange) => exchange,
            Err(err) => return self.drop_event(user_id, &err),
        };

        let messages: Vec<ReplyMessage> = exchange
            .answers
            .into_iter()
            .map(ReplyMessage::text)
            .collect();

        // Delivery is fire-and-forget; a failed send is the sink's problem
        // to log and nobody's to retry (the reply token is single-use).
        if let Err(err) = self.replies.send(reply_token, &messages).await {
            warn!(user_id, error = %err, "reply delivery failed");
        }

        EventOutcome::Delivered {
            fragments: messages.len(),
        }
    }

    /// Resolve the session, converse (with the bounded re-auth retry), and
    /// persist any session-code drift the broker reports.
    async fn converse_correlated(
        &self,
        user_id: &str,
        text: &str,
    ) -> Result<ConversationExchange, BridgeError> {
        // A missing mapping and a broken store look the same downstream:
        // converse without a session code and let the broker open one.
        let known_code = match self.directory.lookup(user_id).await {
            Ok(code) => code.unwrap_or_default(),
            Err(err) => {
                warn!(user_id, error = %err, "session lookup failed; continuing without a session");
                String::new()
            },
        };

        let mut credential = self.tokens.snapshot().await;
        let mut attempts = 0;
        let exchange = loop {
            attempts += 1;
            match self
                .broker
                .converse(&known_code, user_id, text, credential.token.as_ref())
                .await
            {
                Ok(exchange) => break exchange,
                Err(BrokerError::Auth) if attempts < MAX_CONVERSE_ATTEMPTS => {
                    info!(user_id, "broker rejected credential; refreshing");
                    credential = self
                        .tokens
                        .refresh(credential.generation)
                        .await
                        .map_err(BridgeError::Refresh)?;
                },
                Err(err) => return Err(err.into()),
            }
        };

        if exchange.session_code != known_code {
            // Best effort: the conversation continues even if persistence is
            // down; the next turn just re-creates the session broker-side.
            if let Err(err) = self
                .directory
                .record(&exchange.session_code, user_id)
                .await
            {
                warn!(
                    user_id,
                    session_code = %exchange.session_code,
                    error = %err,
                    "failed to persist session mapping; continuing"
                );
            }
        }

        Ok(exchange)
    }

    fn drop_event(&self, user_id: &str, err: &BridgeError) -> EventOutcome {
        match err {
            BridgeError::Broker(BrokerError::Auth) => {
                error!(user_id, "credential rejected again after refresh; dropping event");
                EventOutcome::dropped("credential rejected after refresh")
            },
            BridgeError::Refresh(source) => {
                error!(user_id, error = %source, "credential refresh failed; dropping event");
                EventOutcome::dropped("credential refresh failed")
            },
            BridgeError::Broker(BrokerError::Server { status, body }) => {
                error!(user_id, status = *status, body = %body, "broker server error; dropping event");
                EventOutcome::dropped(format!("broker returned {status}"))
            },
            BridgeError::Broker(source @ BrokerError::Transport(_)) => {
                error!(user_id, error = %source, "broker unreachable; dropping event");
                EventOutcome::dropped("broker unreachable")
            },
            BridgeError::Broker(source @ BrokerError::Decode { .. }) => {
                error!(user_id, error = %source, "unusable broker response; dropping event");
                EventOutcome::dropped("unusable broker response")
            },
        }
    }
}
