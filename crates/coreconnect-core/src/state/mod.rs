//! Authentication state.
//!
//! `AuthState` is the single source of truth for who is signed in. It only
//! changes through [`reduce`], driven by the lifecycle of auth operations,
//! and [`AuthStore`] mirrors every change into the token store.

mod reducer;
mod store;

use coreconnect_types::{AuthTokens, User};
use serde::Serialize;

pub use reducer::{Action, Persist, reduce};
pub use store::AuthStore;

use crate::auth::AuthError;
use crate::token_store::StoredSession;

/// Coarse phase derived from the state flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Unauthenticated,
    /// A request is in flight while signed out
    Authenticating,
    Authenticated,
    /// A request is in flight while signed in
    SessionExpiring,
}

/// Session state shared by every view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthState {
    pub user: Option<User>,
    pub tokens: Option<AuthTokens>,
    pub is_authenticated: bool,
    pub is_loading: bool,
    /// Last rejection, cleared on the next operation or explicitly
    pub error: Option<AuthError>,
    pub email_verification_sent: bool,
    pub password_reset_sent: bool,
}

impl AuthState {
    /// State restored from a persisted session, or signed out without one.
    pub fn hydrated(session: Option<StoredSession>) -> Self {
        match session {
            Some(StoredSession { tokens, user }) => Self {
                user: Some(user),
                tokens: Some(tokens),
                is_authenticated: true,
                ..Self::default()
            },
            None => Self::default(),
        }
    }

    pub fn phase(&self) -> Phase {
        match (self.is_authenticated, self.is_loading) {
            (false, false) => Phase::Unauthenticated,
            (false, true) => Phase::Authenticating,
            (true, false) => Phase::Authenticated,
            (true, true) => Phase::SessionExpiring,
        }
    }

    /// Message of the last rejection, for display.
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.message.as_str())
    }

    pub fn access_token(&self) -> Option<&str> {
        self.tokens.as_ref().map(|t| t.access_token.as_str())
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.tokens.as_ref().map(|t| t.refresh_token.as_str())
    }

    /// The session to persist, when both halves are present.
    pub fn session(&self) -> Option<StoredSession> {
        match (&self.tokens, &self.user) {
            (Some(tokens), Some(user)) => Some(StoredSession {
                tokens: tokens.clone(),
                user: user.clone(),
            }),
            _ => None,
        }
    }

    /// Drops user, tokens, error and both sent-flags. Loading is untouched.
    fn sign_out(&mut self) {
        self.user = None;
        self.tokens = None;
        self.is_authenticated = false;
        self.error = None;
        self.email_verification_sent = false;
        self.password_reset_sent = false;
    }
}
