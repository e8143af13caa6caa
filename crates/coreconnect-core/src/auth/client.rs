use anyhow::{Context, Result};
use coreconnect_types::{AuthTokens, LoginCredentials, RefreshedToken, SignupCredentials, User};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use super::endpoint::{AuthClientConfig, DEFAULT_BASE_URL};
use super::errors::AuthError;
use super::wire::{
    EmailRequest, Envelope, LoginRequest, RefreshData, RefreshTokenRequest, RegisterRequest,
    ResetPasswordRequest, SessionData, VerifyData,
};
use super::mask_token;

/// Normalized result of login and signup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthResponse {
    pub user: User,
    pub tokens: AuthTokens,
    /// Server message from the envelope, if any
    pub message: Option<String>,
    /// Whether a verification email was sent (signup only)
    pub email_sent: bool,
}

/// Response body, parsed only when the server declared JSON.
#[derive(Debug)]
enum Body {
    Json(Value),
    Text(String),
}

#[derive(Debug)]
struct Reply {
    status: u16,
    success: bool,
    body: Body,
}

impl Reply {
    /// Maps a non-2xx reply to Validation (JSON body) or Server (anything else).
    fn into_failure(self, fallback: &str) -> AuthError {
        match self.body {
            Body::Json(value) => AuthError::validation(self.status, &value, fallback),
            Body::Text(text) => AuthError::server(self.status, &text),
        }
    }

    fn json(&self) -> Option<&Value> {
        match &self.body {
            Body::Json(value) => Some(value),
            Body::Text(_) => None,
        }
    }

    /// Extracts `data` from the success envelope.
    fn into_data<T: DeserializeOwned>(self) -> Result<(T, Option<String>), AuthError> {
        let Body::Json(value) = self.body else {
            return Err(AuthError::invalid_response(format!(
                "Unexpected non-JSON response from server (HTTP {})",
                self.status
            )));
        };
        let envelope: Envelope<T> = serde_json::from_value(value).map_err(|e| {
            AuthError::invalid_response(format!("Failed to parse server response: {e}"))
        })?;
        let data = envelope
            .data
            .ok_or_else(|| AuthError::invalid_response("Server response is missing `data`"))?;
        Ok((data, envelope.message))
    }
}

/// HTTP client for the `/api/auth` endpoints.
///
/// Performs exactly one request per call and never touches session state;
/// the caller decides what a result means for the session.
#[derive(Debug, Clone)]
pub struct AuthClient {
    base: Url,
    http: reqwest::Client,
}

impl AuthClient {
    /// Creates a new auth client.
    ///
    /// With `CORECONNECT_BLOCK_REAL_API=1`, refuses to target the hosted API so
    /// test harnesses cannot reach production by accident.
    ///
    /// # Errors
    /// Returns an error if the base URL is malformed or the HTTP client cannot be built.
    pub fn new(config: AuthClientConfig) -> Result<Self> {
        if std::env::var("CORECONNECT_BLOCK_REAL_API").is_ok_and(|v| v == "1")
            && config.base_url.trim_end_matches('/') == DEFAULT_BASE_URL
        {
            anyhow::bail!(
                "CORECONNECT_BLOCK_REAL_API=1 but the hosted API is configured; \
                 set CORECONNECT_API_URL to a mock server"
            );
        }

        let base = Url::parse(&config.base_url)
            .with_context(|| format!("Invalid API base URL: {}", config.base_url))?;
        if base.cannot_be_a_base() {
            anyhow::bail!("API base URL must be hierarchical: {}", config.base_url);
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("build HTTP client")?;

        Ok(Self { base, http })
    }

    /// `POST /api/auth/login`
    ///
    /// # Errors
    /// Validation (JSON error body), Server (non-JSON error body), Network,
    /// or InvalidResponse (malformed success body).
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<AuthResponse, AuthError> {
        let request = self
            .request(Method::POST, "/api/auth/login")
            .json(&LoginRequest {
                email: &credentials.email,
                password: &credentials.password,
            });
        let reply = self.execute("login", request).await?;
        if !reply.success {
            return Err(reply.into_failure("Login failed"));
        }

        let (data, message) = reply.into_data::<SessionData>()?;
        let (user, tokens, _) = data.into_parts();
        info!(user_id = %user.id, token = %mask_token(&tokens.access_token), "login succeeded");
        Ok(AuthResponse {
            user,
            tokens,
            message,
            email_sent: false,
        })
    }

    /// `POST /api/auth/register`
    ///
    /// Fails with PasswordMismatch before any request when the passwords differ.
    ///
    /// # Errors
    /// PasswordMismatch, Validation, Server, Network or InvalidResponse.
    pub async fn signup(&self, credentials: &SignupCredentials) -> Result<AuthResponse, AuthError> {
        if !credentials.passwords_match() {
            return Err(AuthError::password_mismatch());
        }

        let request = self
            .request(Method::POST, "/api/auth/register")
            .json(&RegisterRequest::from(credentials));
        let reply = self.execute("signup", request).await?;
        if !reply.success {
            return Err(reply.into_failure("Signup failed"));
        }

        let (data, message) = reply.into_data::<SessionData>()?;
        let (user, tokens, email_sent) = data.into_parts();
        info!(user_id = %user.id, email_sent, "signup succeeded");
        Ok(AuthResponse {
            user,
            tokens,
            message,
            email_sent,
        })
    }

    /// `POST /api/auth/logout`
    ///
    /// Best effort: failures are logged and swallowed so local teardown can
    /// always proceed. Sends nothing when no tokens are held.
    pub async fn logout(&self, tokens: Option<&AuthTokens>) {
        let Some(tokens) = tokens else {
            debug!("no session held, skipping server logout");
            return;
        };

        let request = self
            .request(Method::POST, "/api/auth/logout")
            .header(AUTHORIZATION, tokens.authorization_header())
            .json(&RefreshTokenRequest {
                refresh_token: &tokens.refresh_token,
            });

        match self.execute("logout", request).await {
            Ok(reply) if reply.success => debug!("server session invalidated"),
            Ok(reply) => warn!(
                status = reply.status,
                "logout rejected by server, clearing local session anyway"
            ),
            Err(err) => warn!(error = %err, "logout request failed, clearing local session anyway"),
        }
    }

    /// `GET /api/auth/verify`
    ///
    /// # Errors
    /// NoToken (nothing sent), TokenInvalid (any non-2xx), Network or InvalidResponse.
    pub async fn verify_token(&self, access_token: Option<&str>) -> Result<User, AuthError> {
        let Some(access_token) = access_token else {
            return Err(AuthError::no_token("No token found"));
        };

        let request = self
            .request(Method::GET, "/api/auth/verify")
            .header(AUTHORIZATION, format!("Bearer {access_token}"));
        let reply = self.execute("verify", request).await?;
        if !reply.success {
            return Err(AuthError::token_invalid(reply.status, reply.json()));
        }

        let (data, _) = reply.into_data::<VerifyData>()?;
        Ok(data.user)
    }

    /// `POST /api/auth/refresh`
    ///
    /// # Errors
    /// NoToken (nothing sent), RefreshFailed (any non-2xx), Network or InvalidResponse.
    pub async fn refresh_token(
        &self,
        refresh_token: Option<&str>,
    ) -> Result<RefreshedToken, AuthError> {
        let Some(refresh_token) = refresh_token else {
            return Err(AuthError::no_token("No refresh token found"));
        };

        let request = self
            .request(Method::POST, "/api/auth/refresh")
            .json(&RefreshTokenRequest { refresh_token });
        let reply = self.execute("refresh", request).await?;
        if !reply.success {
            return Err(AuthError::refresh_failed(reply.status, reply.json()));
        }

        let (data, _) = reply.into_data::<RefreshData>()?;
        Ok(data.into())
    }

    /// `POST /api/auth/forgot-password`
    ///
    /// # Errors
    /// Validation, Server or Network.
    pub async fn forgot_password(&self, email: &str) -> Result<(), AuthError> {
        let request = self
            .request(Method::POST, "/api/auth/forgot-password")
            .json(&EmailRequest { email });
        self.fire("forgot-password", request, "Failed to send reset email")
            .await
    }

    /// `POST /api/auth/reset-password`
    ///
    /// # Errors
    /// Validation, Server or Network.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AuthError> {
        let request = self
            .request(Method::POST, "/api/auth/reset-password")
            .json(&ResetPasswordRequest {
                token,
                new_password,
            });
        self.fire("reset-password", request, "Password reset failed")
            .await
    }

    /// `GET /api/auth/verify-email/:token`
    ///
    /// # Errors
    /// Validation, Server or Network.
    pub async fn verify_email(&self, token: &str) -> Result<(), AuthError> {
        let mut url = self.endpoint("/api/auth/verify-email");
        url.path_segments_mut()
            .map_err(|()| AuthError::invalid_response("API base URL cannot carry a path"))?
            .push(token);
        let request = self.http.get(url);
        self.fire("verify-email", request, "Email verification failed")
            .await
    }

    /// `POST /api/auth/resend-verification`
    ///
    /// # Errors
    /// Validation, Server or Network.
    pub async fn resend_verification(&self, email: &str) -> Result<(), AuthError> {
        let request = self
            .request(Method::POST, "/api/auth/resend-verification")
            .json(&EmailRequest { email });
        self.fire(
            "resend-verification",
            request,
            "Failed to resend verification email",
        )
        .await
    }

    /// Sends a request whose success carries no payload.
    async fn fire(
        &self,
        operation: &'static str,
        request: RequestBuilder,
        fallback: &str,
    ) -> Result<(), AuthError> {
        let reply = self.execute(operation, request).await?;
        if reply.success {
            Ok(())
        } else {
            Err(reply.into_failure(fallback))
        }
    }

    fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base.clone();
        let joined = format!("{}{}", self.base.path().trim_end_matches('/'), path);
        url.set_path(&joined);
        url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, self.endpoint(path))
            .header("accept", "application/json")
    }

    /// Sends the request and reads the body, sniffing the content type.
    async fn execute(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<Reply, AuthError> {
        debug!(operation, "sending auth request");
        let response = request.send().await.map_err(Self::classify_reqwest_error)?;

        let status = response.status();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("json"));
        let text = response
            .text()
            .await
            .map_err(Self::classify_reqwest_error)?;

        let body = if is_json {
            match serde_json::from_str(&text) {
                Ok(value) => Body::Json(value),
                Err(e) => {
                    debug!(operation, error = %e, "JSON content type but body did not parse");
                    Body::Text(text)
                }
            }
        } else {
            Body::Text(text)
        };

        debug!(operation, status = status.as_u16(), "auth response received");
        Ok(Reply {
            status: status.as_u16(),
            success: status.is_success(),
            body,
        })
    }

    /// Classifies a reqwest error into an AuthError.
    fn classify_reqwest_error(e: reqwest::Error) -> AuthError {
        if e.is_timeout() {
            AuthError::network(format!("Network error: request timed out ({e})"))
        } else if e.is_connect() {
            AuthError::network(format!("Network error: connection failed ({e})"))
        } else {
            AuthError::network(format!("Network error: {e}"))
        }
    }
}
