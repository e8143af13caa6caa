use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Categories of auth failures so callers can branch without parsing text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum AuthErrorKind {
    /// The request never produced a response (offline, DNS, TLS, timeout)
    Network,
    /// Non-2xx whose body was not JSON (proxy or HTML error page)
    Server { status: u16 },
    /// Non-2xx JSON body; the server message is surfaced verbatim
    Validation { status: u16 },
    /// Local precondition: no token held, no request sent
    NoToken,
    /// Local precondition: signup passwords differ, no request sent
    PasswordMismatch,
    /// Verify endpoint rejected the access token
    TokenInvalid,
    /// Refresh endpoint rejected the refresh token
    RefreshFailed,
    /// 2xx whose body did not have the expected shape
    InvalidResponse,
    /// Session ended because the refresh token was rejected
    SessionExpired,
    /// A newer dispatch made this operation's result stale
    Superseded,
}

impl fmt::Display for AuthErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthErrorKind::Network => write!(f, "network"),
            AuthErrorKind::Server { status } => write!(f, "server_error({status})"),
            AuthErrorKind::Validation { status } => write!(f, "validation({status})"),
            AuthErrorKind::NoToken => write!(f, "no_token"),
            AuthErrorKind::PasswordMismatch => write!(f, "password_mismatch"),
            AuthErrorKind::TokenInvalid => write!(f, "token_invalid"),
            AuthErrorKind::RefreshFailed => write!(f, "refresh_failed"),
            AuthErrorKind::InvalidResponse => write!(f, "invalid_response"),
            AuthErrorKind::SessionExpired => write!(f, "session_expired"),
            AuthErrorKind::Superseded => write!(f, "superseded"),
        }
    }
}

/// Structured auth error with kind and a user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthError {
    /// Error category
    pub kind: AuthErrorKind,
    /// One-line summary suitable for display
    pub message: String,
    /// Optional additional details (error code, field errors, raw body)
    pub details: Option<String>,
}

impl AuthError {
    /// Creates a new auth error.
    pub fn new(kind: AuthErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(AuthErrorKind::Network, message)
    }

    /// Non-JSON error body. The body is never parsed, only kept as details.
    pub fn server(status: u16, body: &str) -> Self {
        let err = Self::new(
            AuthErrorKind::Server { status },
            format!("Server error (HTTP {status})"),
        );
        if body.trim().is_empty() {
            err
        } else {
            err.with_details(truncate(body.trim(), 500))
        }
    }

    /// JSON error body. Uses the server `message` or the operation's fallback.
    pub fn validation(status: u16, body: &Value, fallback: &str) -> Self {
        let message = server_message(body).unwrap_or(fallback).to_string();
        let err = Self::new(AuthErrorKind::Validation { status }, message);
        match error_details(body) {
            Some(details) => err.with_details(details),
            None => err,
        }
    }

    pub fn no_token(message: impl Into<String>) -> Self {
        Self::new(AuthErrorKind::NoToken, message)
    }

    pub fn password_mismatch() -> Self {
        Self::new(AuthErrorKind::PasswordMismatch, "Passwords do not match")
    }

    pub fn token_invalid(status: u16, body: Option<&Value>) -> Self {
        Self::status_failure(
            AuthErrorKind::TokenInvalid,
            "Token verification failed",
            status,
            body,
        )
    }

    pub fn refresh_failed(status: u16, body: Option<&Value>) -> Self {
        Self::status_failure(
            AuthErrorKind::RefreshFailed,
            "Token refresh failed",
            status,
            body,
        )
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(AuthErrorKind::InvalidResponse, message)
    }

    pub fn session_expired() -> Self {
        Self::new(
            AuthErrorKind::SessionExpired,
            "Session expired. Please login again.",
        )
    }

    pub fn superseded(operation: &str) -> Self {
        Self::new(
            AuthErrorKind::Superseded,
            format!("{operation} was superseded by a newer request"),
        )
    }

    /// Returns true if the failure happened before any request was sent.
    pub fn is_local(&self) -> bool {
        matches!(
            self.kind,
            AuthErrorKind::NoToken | AuthErrorKind::PasswordMismatch
        )
    }

    /// HTTP status of the failed response, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self.kind {
            AuthErrorKind::Server { status } | AuthErrorKind::Validation { status } => {
                Some(status)
            }
            _ => None,
        }
    }

    fn status_failure(
        kind: AuthErrorKind,
        summary: &str,
        status: u16,
        body: Option<&Value>,
    ) -> Self {
        let message = match body.and_then(server_message) {
            Some(msg) => format!("{summary} (HTTP {status}): {msg}"),
            None => format!("{summary} (HTTP {status})"),
        };
        Self::new(kind, message)
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AuthError {}

fn server_message(body: &Value) -> Option<&str> {
    body.get("message")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|msg| !msg.is_empty())
}

/// Collects `error_code` and `validation_errors` from the error envelope.
fn error_details(body: &Value) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(code) = body.get("error_code").and_then(Value::as_str) {
        parts.push(format!("code: {code}"));
    }
    if let Some(fields) = body.get("validation_errors").and_then(Value::as_object) {
        for (field, errors) in fields {
            let joined = match errors {
                Value::Array(items) => items
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(", "),
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            parts.push(format!("{field}: {joined}"));
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("; "))
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let head: String = s.chars().take(max_chars).collect();
    format!("{head}...")
}
