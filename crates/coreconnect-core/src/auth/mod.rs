//! HTTP access to the `/api/auth` endpoints.
//!
//! The client is stateless: each call maps to one request and returns a
//! normalized result. Session state lives in [`crate::state`].

mod client;
mod endpoint;
mod errors;
mod wire;

pub use client::{AuthClient, AuthResponse};
pub use endpoint::{API_URL_ENV, AuthClientConfig, DEFAULT_BASE_URL};
pub use errors::{AuthError, AuthErrorKind};

/// Returns a masked version of a token for display (first and last 4 chars).
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 12 {
        return "***".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token("eyJhbGciOiJIUzI1NiJ9.payload.sig"), "eyJh....sig");
        assert_eq!(mask_token("short"), "***");
    }
}
