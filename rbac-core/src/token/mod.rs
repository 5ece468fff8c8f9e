//! Bearer token decoding and the pure functions derived from it.
//!
//! Decoding is structural only: the payload segment is base64url-decoded
//! and parsed as a JSON object. Signatures are not verified here; the
//! remote service is the verifier and this client only consumes identity.

pub mod claims;

use base64::{engine::general_purpose, Engine as _};
use chrono::Utc;
use serde_json::Value;

pub use claims::Claims;

/// Decode the claims segment of a token.
///
/// Returns `None` for anything that is not a three-segment token with a
/// base64url JSON object as its second segment.
pub fn decode(token: &str) -> Option<Claims> {
    let mut segments = token.split('.');
    let payload = match (segments.next(), segments.next(), segments.next(), segments.next()) {
        (Some(_), Some(payload), Some(_), None) => payload.trim_end_matches('='),
        _ => return None,
    };
    if payload.is_empty() {
        return None;
    }

    let bytes = general_purpose::URL_SAFE_NO_PAD
        .decode(payload)
        .or_else(|_| general_purpose::STANDARD_NO_PAD.decode(payload))
        .ok()?;

    match serde_json::from_slice::<Value>(&bytes).ok()? {
        Value::Object(map) => Some(Claims::new(map)),
        _ => None,
    }
}

/// Roles carried by the token; empty when it cannot be decoded.
pub fn roles_of(token: &str) -> Vec<String> {
    decode(token).map(|claims| claims.roles()).unwrap_or_default()
}

pub fn user_id_of(token: &str) -> Option<String> {
    decode(token)?.user_id()
}

pub fn email_of(token: &str) -> Option<String> {
    decode(token)?.email().map(str::to_string)
}

/// Whether the token expired before `now` (seconds since the epoch).
///
/// Undecodable tokens and tokens without an expiry are treated as not
/// expired. A token expiring exactly at `now` is still valid.
pub fn is_expired_at(token: &str, now: i64) -> bool {
    match decode(token).and_then(|claims| claims.expires_at()) {
        Some(exp) => exp < now,
        None => false,
    }
}

/// [`is_expired_at`] against the wall clock.
pub fn is_expired(token: &str) -> bool {
    is_expired_at(token, Utc::now().timestamp())
}
