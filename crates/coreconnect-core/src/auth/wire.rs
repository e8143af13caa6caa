//! Request and response bodies for the `/api/auth` endpoints.

use coreconnect_types::{AuthTokens, RefreshedToken, SignupCredentials, User};
use serde::{Deserialize, Serialize};

/// Success envelope: `{success, message, data, timestamp}`.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Signup body. `confirmPassword` is deliberately absent.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RegisterRequest<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<&'a str>,
}

impl<'a> From<&'a SignupCredentials> for RegisterRequest<'a> {
    fn from(creds: &'a SignupCredentials) -> Self {
        Self {
            first_name: &creds.first_name,
            last_name: &creds.last_name,
            email: &creds.email,
            password: &creds.password,
            username: creds
                .username
                .as_deref()
                .map(str::trim)
                .filter(|u| !u.is_empty()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RefreshTokenRequest<'a> {
    pub refresh_token: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct EmailRequest<'a> {
    pub email: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ResetPasswordRequest<'a> {
    pub token: &'a str,
    pub new_password: &'a str,
}

/// `data` of login and register responses.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SessionData {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub email_sent: bool,
}

impl SessionData {
    pub fn into_parts(self) -> (User, AuthTokens, bool) {
        let mut tokens = AuthTokens::new(self.access_token, self.refresh_token, self.expires_in);
        if let Some(token_type) = self.token_type {
            tokens.token_type = token_type;
        }
        (self.user, tokens, self.email_sent)
    }
}

/// `data` of the verify response.
#[derive(Debug, Deserialize)]
pub(crate) struct VerifyData {
    pub user: User,
}

/// `data` of the refresh response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RefreshData {
    pub access_token: String,
    pub expires_in: u64,
    #[serde(default)]
    pub token_type: Option<String>,
}

impl From<RefreshData> for RefreshedToken {
    fn from(data: RefreshData) -> Self {
        let mut refreshed = RefreshedToken::new(data.access_token, data.expires_in);
        if let Some(token_type) = data.token_type {
            refreshed.token_type = token_type;
        }
        refreshed
    }
}
