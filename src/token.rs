//! Bearer token inspection.
//!
//! The API issues JWT-shaped tokens. The server is the authority on
//! whether a token is *valid*; all we do client-side is read the `exp`
//! claim out of the middle segment so we can clear dead sessions without
//! a round-trip and know when to refresh. Anything that fails to decode
//! is treated as expired.

use serde_derive::Deserialize;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// How long before expiry the refresh request should fire, in seconds.
pub const REFRESH_LEAD_TIME: i64 = 3600;

/// The earliest a refresh may be scheduled, in seconds from now.
pub const MIN_REFRESH_DELAY: i64 = 60;

/// The claims we care about from the token's payload segment.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Claims {
    /// Expiry as seconds since the unix epoch.
    pub exp: i64,
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub iat: Option<i64>,
}

/// Decode the claims segment of a bearer token.
pub fn decode_claims(token: &str) -> Result<Claims, TokenError> {
    let payload = token.split('.').nth(1).ok_or(TokenError::NotAJwt)?;
    let raw = base64::decode_config(
        payload.trim_end_matches('='),
        base64::URL_SAFE_NO_PAD,
    )?;

    Ok(serde_json::from_slice(&raw)?)
}

/// Is this token past its `exp` claim?
///
/// Fail-closed: a token we can't decode is reported as expired.
pub fn is_expired(token: &str) -> bool { is_expired_at(token, unix_now()) }

pub(crate) fn is_expired_at(token: &str, now: i64) -> bool {
    match decode_claims(token) {
        Ok(claims) => claims.exp < now,
        Err(err) => {
            log::error!("Unable to decode the token, treating it as expired: {}", err);
            true
        },
    }
}

/// How long to wait before refreshing this token.
///
/// Returns [`None`] when the token can't be decoded, in which case there
/// is nothing sensible to schedule.
pub fn refresh_delay(token: &str) -> Option<Duration> {
    let claims = decode_claims(token).ok()?;
    Some(delay_until_refresh(claims.exp, unix_now()))
}

pub(crate) fn delay_until_refresh(exp: i64, now: i64) -> Duration {
    let until_expiry = exp - now;
    let delay = std::cmp::max(until_expiry - REFRESH_LEAD_TIME, MIN_REFRESH_DELAY);

    Duration::from_secs(delay as u64)
}

pub(crate) fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as i64)
        .unwrap_or(0)
}

/// Errors encountered while decoding a token.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// The token doesn't have a `header.payload.signature` shape.
    #[error("The token has no claims segment")]
    NotAJwt,
    #[error("Unable to decode the claims segment")]
    Base64(#[from] base64::DecodeError),
    #[error("Unable to parse the claims")]
    Parse(#[from] serde_json::Error),
}
