//! Auth command handlers.

use anyhow::{Context, Result};
use coreconnect_core::auth::mask_token;
use coreconnect_core::config::Config;
use coreconnect_core::guard::{Location, post_login_target};
use coreconnect_types::{LoginCredentials, SignupCredentials};

use super::{open_store, secret_or_stdin};

pub struct SignupArgs {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
}

pub async fn login(
    config: &Config,
    email: &str,
    password: Option<&str>,
    from: Option<&str>,
) -> Result<()> {
    let password = secret_or_stdin(password, "Password")?;
    let store = open_store(config)?;

    let response = store
        .login(&LoginCredentials::new(email.trim(), password))
        .await?;

    println!("✓ Logged in as {}", response.user.display_name());
    println!("  Token: {}", mask_token(&response.tokens.access_token));
    let from = from.map(Location::parse);
    println!(
        "  Continue to: {}",
        post_login_target(from.as_ref(), &config.default_redirect)
    );
    Ok(())
}

pub async fn signup(config: &Config, args: SignupArgs) -> Result<()> {
    let password = secret_or_stdin(args.password.as_deref(), "Password")?;
    let confirm_password = args.confirm_password.unwrap_or_else(|| password.clone());
    let credentials = SignupCredentials {
        first_name: args.first_name,
        last_name: args.last_name,
        email: args.email.trim().to_string(),
        password,
        confirm_password,
        username: args.username,
    };

    let store = open_store(config)?;
    let response = store.signup(&credentials).await?;

    println!("✓ Account created for {}", response.user.display_name());
    if response.email_sent {
        println!("  A verification email was sent to {}", response.user.email);
    }
    Ok(())
}

pub async fn logout(config: &Config) -> Result<()> {
    let store = open_store(config)?;
    if !store.state().is_authenticated {
        println!("Not logged in (no session found).");
        return Ok(());
    }

    store.logout().await;
    println!("✓ Logged out");
    Ok(())
}

pub async fn verify(config: &Config) -> Result<()> {
    let store = open_store(config)?;
    let user = store
        .verify_token()
        .await
        .context("Session is no longer valid; stored session cleared")?;
    println!("✓ Session valid for {}", user.display_name());
    Ok(())
}

pub async fn refresh(config: &Config) -> Result<()> {
    let store = open_store(config)?;
    let refreshed = store.refresh_token().await?;
    println!(
        "✓ Access token refreshed ({}), expires in {}s",
        mask_token(&refreshed.access_token),
        refreshed.expires_in
    );
    Ok(())
}

pub async fn forgot_password(config: &Config, email: &str) -> Result<()> {
    let store = open_store(config)?;
    store.forgot_password(email.trim()).await?;
    println!("✓ If an account exists for {email}, a reset link has been sent.");
    Ok(())
}

pub async fn reset_password(
    config: &Config,
    token: &str,
    new_password: Option<&str>,
) -> Result<()> {
    let new_password = secret_or_stdin(new_password, "New password")?;
    let store = open_store(config)?;
    store.reset_password(token.trim(), &new_password).await?;
    println!("✓ Password updated. You can now log in.");
    Ok(())
}

pub async fn verify_email(config: &Config, token: &str) -> Result<()> {
    let store = open_store(config)?;
    store.verify_email(token.trim()).await?;
    println!("✓ Email verified");
    Ok(())
}

pub async fn resend_verification(config: &Config, email: &str) -> Result<()> {
    let store = open_store(config)?;
    store.resend_verification(email.trim()).await?;
    println!("✓ Verification email sent to {email}");
    Ok(())
}
