use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    #[error("platform API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("webhook signature verification failed")]
    SignatureMismatch,
}

pub type Result<T> = std::result::Result<T, Error>;
