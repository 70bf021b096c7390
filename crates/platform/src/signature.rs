//! Webhook signature verification.
//!
//! The platform signs every webhook delivery with HMAC-SHA256 over the raw
//! request body, base64-encoded into a header. Verification must run on the
//! exact bytes received, before any JSON parsing.

use {
    base64::{Engine, engine::general_purpose::STANDARD},
    hmac::{Hmac, Mac},
    sha2::Sha256,
};

use crate::error::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

/// Verify a base64-encoded HMAC-SHA256 signature against the raw body.
///
/// Comparison is constant-time via the hmac crate's `verify_slice`.
pub fn verify_signature(channel_secret: &str, body: &[u8], signature_b64: &str) -> Result<()> {
    let expected = STANDARD
        .decode(signature_b64)
        .map_err(|_| Error::SignatureMismatch)?;

    let mut mac = HmacSha256::new_from_slice(channel_secret.as_bytes())
        .map_err(|_| Error::SignatureMismatch)?;
    mac.update(body);

    mac.verify_slice(&expected)
        .map_err(|_| Error::SignatureMismatch)
}

/// Compute the signature the platform would send for `body`. Test helper,
/// also handy for local webhook replay tooling.
#[must_use]
pub fn sign(channel_secret: &str, body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(channel_secret.as_bytes())
        .unwrap_or_else(|_| unreachable!("hmac accepts any key length"));
    mac.update(body);
    STANDARD.encode(mac.finalize().into_bytes())
}
