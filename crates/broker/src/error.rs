use thiserror::Error;

/// Failure modes of one broker conversation call.
///
/// None of these are retried here; the bridge decides what each one means
/// for the event being processed.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// HTTP 401 — the shared bearer credential is stale or invalid.
    #[error("broker rejected the bearer credential")]
    Auth,

    /// Any non-401 error status; the body is kept for logging.
    #[error("broker returned {status}: {body}")]
    Server { status: u16, body: String },

    /// Network-level failure (DNS, refused connection, timeout).
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    /// 2xx response whose payload did not parse.
    #[error("malformed broker response: {message}")]
    Decode { message: String },
}
