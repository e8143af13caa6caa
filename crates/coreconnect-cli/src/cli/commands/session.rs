//! Local session commands (no network).

use anyhow::Result;
use chrono::Utc;
use coreconnect_core::auth::mask_token;
use coreconnect_core::config::Config;
use coreconnect_core::guard::{GuardDecision, Location, RouteGuard};
use coreconnect_core::state::AuthState;

use super::open_store;

pub fn status(config: &Config) -> Result<()> {
    let store = open_store(config)?;
    let state = store.state();

    let (Some(user), Some(tokens)) = (&state.user, &state.tokens) else {
        println!("Not logged in");
        return Ok(());
    };

    let now = Utc::now();
    println!("Logged in as {} <{}>", user.display_name(), user.email);
    println!("  Role:     {}", user.role);
    println!("  Verified: {}", if user.is_verified { "yes" } else { "no" });
    println!("  Access:   {}", mask_token(&tokens.access_token));
    println!("  Refresh:  {}", mask_token(&tokens.refresh_token));
    if tokens.is_expired_at(now) {
        println!(
            "  Expired:  {} (run `coreconnect refresh`)",
            tokens.expires_at().to_rfc3339()
        );
    } else {
        println!(
            "  Expires:  {} ({}s left)",
            tokens.expires_at().to_rfc3339(),
            tokens.remaining_secs_at(now)
        );
    }
    Ok(())
}

pub fn whoami(config: &Config) -> Result<()> {
    let store = open_store(config)?;
    let state = store.state();
    let location = Location::parse("/profile");

    guarded(config, &state, &location, |state| {
        if let Some(user) = &state.user {
            println!("{}", user.display_name());
            println!("{}", user.email);
        }
    });
    Ok(())
}

pub fn open(config: &Config, path: &str) -> Result<()> {
    let store = open_store(config)?;
    let location = Location::parse(path);

    guarded(config, &store.state(), &location, |_| {
        println!("Opening {location}");
    });
    Ok(())
}

/// Runs `render` when the guard allows the location, otherwise prints the redirect.
fn guarded(
    config: &Config,
    state: &AuthState,
    location: &Location,
    render: impl FnOnce(&AuthState),
) {
    match RouteGuard::from_config(config).check(state, location) {
        GuardDecision::Allow => render(state),
        GuardDecision::Redirect { to, from } => {
            println!("Redirecting to {to} (from {from})");
        }
    }
}
