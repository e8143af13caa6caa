//! AuthClient against a mock API server.

use coreconnect_core::auth::{AuthClient, AuthClientConfig, AuthErrorKind};
use coreconnect_types::{AuthTokens, LoginCredentials, SignupCredentials};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> AuthClient {
    AuthClient::new(AuthClientConfig::new(server.uri())).unwrap()
}

fn session_body() -> serde_json::Value {
    json!({
        "success": true,
        "message": "Login successful",
        "data": {
            "user": {"id": "u1", "email": "user@example.com"},
            "accessToken": "a",
            "refreshToken": "r",
            "expiresIn": 900,
            "tokenType": "Bearer"
        },
        "timestamp": "2026-03-01T12:00:00.000Z"
    })
}

fn signup(confirm: &str) -> SignupCredentials {
    SignupCredentials {
        first_name: "Ada".into(),
        last_name: "Lovelace".into(),
        email: "ada@example.com".into(),
        password: "secret123".into(),
        confirm_password: confirm.into(),
        username: None,
    }
}

#[tokio::test]
async fn test_login_success_normalizes_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({"email": "user@example.com", "password": "secret123"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_body()))
        .expect(1)
        .mount(&server)
        .await;

    let response = client_for(&server)
        .login(&LoginCredentials::new("user@example.com", "secret123"))
        .await
        .unwrap();

    assert_eq!(response.user.id, "u1");
    assert_eq!(response.tokens.access_token, "a");
    assert_eq!(response.tokens.refresh_token, "r");
    assert_eq!(response.tokens.expires_in, 900);
    assert_eq!(response.message.as_deref(), Some("Login successful"));
}

#[tokio::test]
async fn test_login_rejected_with_json_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"success": false, "message": "Invalid email or password"})),
        )
        .mount(&server)
        .await;

    let err = client_for(&server)
        .login(&LoginCredentials::new("user@example.com", "wrong"))
        .await
        .unwrap_err();

    assert_eq!(err.kind, AuthErrorKind::Validation { status: 401 });
    assert_eq!(err.message, "Invalid email or password");
}

#[tokio::test]
async fn test_login_html_error_page_is_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_raw("<html><body>Internal Server Error</body></html>", "text/html"),
        )
        .mount(&server)
        .await;

    let err = client_for(&server)
        .login(&LoginCredentials::new("user@example.com", "secret123"))
        .await
        .unwrap_err();

    assert_eq!(err.kind, AuthErrorKind::Server { status: 500 });
    assert!(err.message.contains("500"));
}

#[tokio::test]
async fn test_json_error_without_message_uses_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/register"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"success": false})))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .signup(&signup("secret123"))
        .await
        .unwrap_err();
    assert_eq!(err.message, "Signup failed");
}

#[tokio::test]
async fn test_success_without_json_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("OK", "text/plain"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .login(&LoginCredentials::new("user@example.com", "secret123"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, AuthErrorKind::InvalidResponse);
}

#[tokio::test]
async fn test_signup_password_mismatch_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/register"))
        .respond_with(ResponseTemplate::new(201).set_body_json(session_body()))
        .expect(0)
        .mount(&server)
        .await;

    let err = client_for(&server)
        .signup(&signup("different"))
        .await
        .unwrap_err();

    assert_eq!(err.kind, AuthErrorKind::PasswordMismatch);
    assert_eq!(err.message, "Passwords do not match");
}

#[tokio::test]
async fn test_signup_omits_confirm_password_and_reports_email_sent() {
    let server = MockServer::start().await;
    let mut body = session_body();
    body["data"]["emailSent"] = json!(true);

    Mock::given(method("POST"))
        .and(path("/api/auth/register"))
        .and(body_json(json!({
            "firstName": "Ada",
            "lastName": "Lovelace",
            "email": "ada@example.com",
            "password": "secret123"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(body))
        .expect(1)
        .mount(&server)
        .await;

    let response = client_for(&server).signup(&signup("secret123")).await.unwrap();
    assert!(response.email_sent);
}

#[tokio::test]
async fn test_verify_sends_bearer_and_returns_user() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/verify"))
        .and(header("authorization", "Bearer a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"user": {"id": "u1", "email": "user@example.com", "role": "HR", "isVerified": true}}
        })))
        .mount(&server)
        .await;

    let user = client_for(&server).verify_token(Some("a")).await.unwrap();
    assert_eq!(user.id, "u1");
    assert!(user.is_verified);
}

#[tokio::test]
async fn test_verify_rejection_is_token_invalid() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/verify"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"message": "Token has expired"})),
        )
        .mount(&server)
        .await;

    let err = client_for(&server)
        .verify_token(Some("stale"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, AuthErrorKind::TokenInvalid);
    assert!(err.message.contains("401"));
}

#[tokio::test]
async fn test_missing_tokens_fail_locally() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.verify_token(None).await.unwrap_err();
    assert_eq!(err.kind, AuthErrorKind::NoToken);
    assert_eq!(err.message, "No token found");

    let err = client.refresh_token(None).await.unwrap_err();
    assert_eq!(err.message, "No refresh token found");

    client.logout(None).await;
}

#[tokio::test]
async fn test_refresh_returns_new_access_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .and(body_json(json!({"refreshToken": "r"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"accessToken": "a2", "expiresIn": 1800, "tokenType": "Bearer"}
        })))
        .mount(&server)
        .await;

    let refreshed = client_for(&server).refresh_token(Some("r")).await.unwrap();
    assert_eq!(refreshed.access_token, "a2");
    assert_eq!(refreshed.expires_in, 1800);
}

#[tokio::test]
async fn test_refresh_rejection_is_refresh_failed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(ResponseTemplate::new(403).set_body_raw("Forbidden", "text/plain"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .refresh_token(Some("r"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, AuthErrorKind::RefreshFailed);
    assert_eq!(err.message, "Token refresh failed (HTTP 403)");
}

#[tokio::test]
async fn test_logout_failure_is_swallowed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .and(header("authorization", "Bearer a"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let tokens = AuthTokens::new("a".into(), "r".into(), 900);
    client_for(&server).logout(Some(&tokens)).await;
}

#[tokio::test]
async fn test_verify_email_token_is_one_path_segment() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/verify-email/abc%2Fdef"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server).verify_email("abc/def").await.unwrap();
}

#[tokio::test]
async fn test_password_reset_flow_requests() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/forgot-password"))
        .and(body_json(json!({"email": "ada@example.com"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/reset-password"))
        .and(body_json(json!({"token": "t1", "newPassword": "n3wpass"})))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"success": false, "message": "Invalid or expired token"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.forgot_password("ada@example.com").await.unwrap();
    let err = client.reset_password("t1", "n3wpass").await.unwrap_err();
    assert_eq!(err.message, "Invalid or expired token");
}

#[tokio::test]
async fn test_resend_verification_uses_fallback_on_bare_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/resend-verification"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({})))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .resend_verification("ada@example.com")
        .await
        .unwrap_err();
    assert_eq!(err.kind, AuthErrorKind::Validation { status: 429 });
    assert_eq!(err.message, "Failed to resend verification email");
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    let client = AuthClient::new(AuthClientConfig::new("http://127.0.0.1:1")).unwrap();
    let err = client
        .login(&LoginCredentials::new("user@example.com", "secret123"))
        .await
        .unwrap_err();

    assert_eq!(err.kind, AuthErrorKind::Network);
    assert!(err.message.starts_with("Network error"));
}
