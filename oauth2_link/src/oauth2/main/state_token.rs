//! Signed, timestamped tokens carried in the OAuth2 `state` parameter.
//!
//! A token binds the session's state validation value to its issue time:
//! `"<unix-seconds>:<base64url(HMAC-SHA256(key, "oauth2-state:" secret ":" ts))>"`.
//! The validation value itself is never part of the token, so the token is
//! useless without the session that issued it.

use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::utils::{base64url_decode, base64url_encode};

type HmacSha256 = Hmac<Sha256>;

const DOMAIN: &[u8] = b"oauth2-state:";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateTokenError {
    #[error("State token expired")]
    Expired,

    #[error("State token invalid: {0}")]
    Invalid(String),
}

/// Issues and verifies state tokens with a process-wide signing key.
#[derive(Clone)]
pub struct StateSigner {
    key: Arc<Vec<u8>>,
}

impl std::fmt::Debug for StateSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateSigner").finish_non_exhaustive()
    }
}

impl StateSigner {
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self {
            key: Arc::new(key.into()),
        }
    }

    /// Signs `session_secret` together with the current time.
    pub fn issue(&self, session_secret: &str) -> String {
        self.issue_at(session_secret, Utc::now().timestamp())
    }

    /// Checks that `token` was issued for `session_secret` no more than `max_age` ago.
    ///
    /// The signature is checked before the age, so a forged token is always
    /// reported as invalid and a genuine but stale one as expired.
    pub fn verify(
        &self,
        token: &str,
        session_secret: &str,
        max_age: Duration,
    ) -> Result<(), StateTokenError> {
        self.verify_at(token, session_secret, max_age, Utc::now().timestamp())
    }

    pub(crate) fn issue_at(&self, session_secret: &str, timestamp: i64) -> String {
        let tag = self.mac(session_secret, timestamp).finalize().into_bytes();
        // base64url_encode cannot fail; fall back to an unverifiable token if it ever does
        let tag = base64url_encode(tag.to_vec()).unwrap_or_default();
        format!("{timestamp}:{tag}")
    }

    fn verify_at(
        &self,
        token: &str,
        session_secret: &str,
        max_age: Duration,
        now: i64,
    ) -> Result<(), StateTokenError> {
        let (timestamp, tag) = token
            .split_once(':')
            .ok_or_else(|| StateTokenError::Invalid("Malformed token".to_string()))?;

        let timestamp: i64 = timestamp
            .parse()
            .map_err(|_| StateTokenError::Invalid("Malformed timestamp".to_string()))?;

        let tag = base64url_decode(tag)
            .map_err(|_| StateTokenError::Invalid("Malformed signature".to_string()))?;

        self.mac(session_secret, timestamp)
            .verify_slice(&tag)
            .map_err(|_| StateTokenError::Invalid("Signature mismatch".to_string()))?;

        let age = now.saturating_sub(timestamp);
        if age > i64::try_from(max_age.as_secs()).unwrap_or(i64::MAX) {
            tracing::debug!("State token age {}s exceeds {}s", age, max_age.as_secs());
            return Err(StateTokenError::Expired);
        }

        Ok(())
    }

    fn mac(&self, session_secret: &str, timestamp: i64) -> HmacSha256 {
        let mut mac =
            HmacSha256::new_from_slice(&self.key).expect("HMAC can take key of any size");
        mac.update(DOMAIN);
        mac.update(session_secret.as_bytes());
        mac.update(b":");
        mac.update(timestamp.to_string().as_bytes());
        mac
    }
}
