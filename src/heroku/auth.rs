//! Helpers around Heroku's use of a shared secret to authenticate webhook
//! requests.
//!
//! The secret is given to Heroku when initialising the webhook. Heroku signs
//! each request body with it and includes the result in a header; we compare
//! our own signature against it to know the request really came from Heroku.
//!
//! <https://devcenter.heroku.com/articles/app-webhooks#using-the-shared-secret>

use axum::http::HeaderMap;
use base64::{engine::general_purpose::STANDARD as b64, Engine};
use hmac::{Hmac, Mac};
use sha2::Sha256;

/// A newtype wrapper around the Heroku webhook secret.
pub struct HerokuSecret(pub String);

/// The header in which Heroku offers its signature.
pub const SIGNATURE_HEADER: &str = "Heroku-Webhook-Hmac-SHA256";

/// Why a request failed signature verification.
#[derive(Debug, PartialEq, Eq)]
pub enum SignatureError {
    Missing,
    Mismatch,
}

/// Verify the signature offered in a request's headers against the one we
/// compute for its body. Requests failing this check should be considered
/// unauthenticated.
pub fn verify(secret: &HerokuSecret, body: &[u8], headers: &HeaderMap) -> Result<(), SignatureError> {
    let offered = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(SignatureError::Missing)?;

    match sign(secret, body) {
        Some(expected) if expected == offered => Ok(()),
        _ => Err(SignatureError::Mismatch),
    }
}

/// Generate a valid signature with our secret for a body.
fn sign(secret: &HerokuSecret, body: &[u8]) -> Option<String> {
    type HmacSha256 = Hmac<Sha256>;

    HmacSha256::new_from_slice(secret.0.as_bytes())
        .map(|mut mac| {
            mac.update(body);
            b64.encode(mac.finalize().into_bytes())
        })
        .ok()
}
