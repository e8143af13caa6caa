//! Bearer credential pair and its expiry arithmetic.
//!
//! `expires_in` is a duration in seconds counted from `issued_at`, the instant
//! the client received the token. Expiry is always derived from both; the raw
//! duration is never compared against the wall clock.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Token type sent by the API for every credential.
pub const BEARER: &str = "Bearer";

fn default_token_type() -> String {
    BEARER.to_string()
}

/// Access/refresh token pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokens {
    /// Short-lived bearer credential
    pub access_token: String,
    /// Long-lived credential used to mint new access tokens
    pub refresh_token: String,
    /// Lifetime of the access token in seconds
    pub expires_in: u64,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// When the access token was received
    pub issued_at: DateTime<Utc>,
}

impl AuthTokens {
    /// Builds a token pair received now.
    pub fn new(access_token: String, refresh_token: String, expires_in: u64) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_in,
            token_type: default_token_type(),
            issued_at: Utc::now(),
        }
    }

    /// Absolute instant at which the access token stops being valid.
    pub fn expires_at(&self) -> DateTime<Utc> {
        let secs = i64::try_from(self.expires_in).unwrap_or(i64::MAX);
        self.issued_at
            .checked_add_signed(Duration::try_seconds(secs).unwrap_or(Duration::MAX))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Returns true if the access token is expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }

    /// Returns true if the access token is expired.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Seconds left before expiry at `now` (zero once expired).
    pub fn remaining_secs_at(&self, now: DateTime<Utc>) -> u64 {
        u64::try_from((self.expires_at() - now).num_seconds()).unwrap_or(0)
    }

    /// Value for the `Authorization` header.
    pub fn authorization_header(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }

    /// Replaces the access token after a refresh. The refresh token is kept.
    pub fn apply_refresh(&mut self, refreshed: &RefreshedToken) {
        self.access_token.clone_from(&refreshed.access_token);
        self.expires_in = refreshed.expires_in;
        self.token_type.clone_from(&refreshed.token_type);
        self.issued_at = refreshed.issued_at;
    }
}

/// New access token returned by the refresh endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshedToken {
    pub access_token: String,
    pub expires_in: u64,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub issued_at: DateTime<Utc>,
}

impl RefreshedToken {
    /// Builds a refreshed token received now.
    pub fn new(access_token: String, expires_in: u64) -> Self {
        Self {
            access_token,
            expires_in,
            token_type: default_token_type(),
            issued_at: Utc::now(),
        }
    }
}
