//! Auth state reducer.
//!
//! Pure transitions: each action mutates the state and reports what the
//! caller must write to the token store. Nothing here performs I/O.

use coreconnect_types::{AuthTokens, RefreshedToken, User, UserPatch};

use super::AuthState;
use crate::auth::{AuthError, AuthResponse};

/// Persistence effect required after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persist {
    None,
    /// Write tokens and user
    Session,
    /// Rewrite the stored user only
    User,
    /// Remove the stored session
    Clear,
}

/// Everything that can change the auth state.
#[derive(Debug, Clone)]
pub enum Action {
    LoginPending,
    LoginFulfilled(AuthResponse),
    LoginRejected(AuthError),

    SignupPending,
    SignupFulfilled(AuthResponse),
    SignupRejected(AuthError),

    LogoutPending,
    LogoutFinished,

    VerifyPending,
    VerifyFulfilled(User),
    VerifyRejected,

    RefreshPending,
    RefreshFulfilled(RefreshedToken),
    RefreshRejected,

    ForgotPasswordPending,
    ForgotPasswordFulfilled,
    ForgotPasswordRejected(AuthError),

    ResetPasswordPending,
    ResetPasswordFulfilled,
    ResetPasswordRejected(AuthError),

    VerifyEmailPending,
    VerifyEmailFulfilled,
    VerifyEmailRejected(AuthError),

    ResendVerificationPending,
    ResendVerificationFulfilled,
    ResendVerificationRejected(AuthError),

    ClearError,
    SetLoading(bool),
    UpdateTokens(AuthTokens),
    ClearAuth,
    UpdateUser(UserPatch),
}

impl Action {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Action::LoginPending => "login/pending",
            Action::LoginFulfilled(_) => "login/fulfilled",
            Action::LoginRejected(_) => "login/rejected",
            Action::SignupPending => "signup/pending",
            Action::SignupFulfilled(_) => "signup/fulfilled",
            Action::SignupRejected(_) => "signup/rejected",
            Action::LogoutPending => "logout/pending",
            Action::LogoutFinished => "logout/finished",
            Action::VerifyPending => "verify/pending",
            Action::VerifyFulfilled(_) => "verify/fulfilled",
            Action::VerifyRejected => "verify/rejected",
            Action::RefreshPending => "refresh/pending",
            Action::RefreshFulfilled(_) => "refresh/fulfilled",
            Action::RefreshRejected => "refresh/rejected",
            Action::ForgotPasswordPending => "forgot-password/pending",
            Action::ForgotPasswordFulfilled => "forgot-password/fulfilled",
            Action::ForgotPasswordRejected(_) => "forgot-password/rejected",
            Action::ResetPasswordPending => "reset-password/pending",
            Action::ResetPasswordFulfilled => "reset-password/fulfilled",
            Action::ResetPasswordRejected(_) => "reset-password/rejected",
            Action::VerifyEmailPending => "verify-email/pending",
            Action::VerifyEmailFulfilled => "verify-email/fulfilled",
            Action::VerifyEmailRejected(_) => "verify-email/rejected",
            Action::ResendVerificationPending => "resend-verification/pending",
            Action::ResendVerificationFulfilled => "resend-verification/fulfilled",
            Action::ResendVerificationRejected(_) => "resend-verification/rejected",
            Action::ClearError => "clear-error",
            Action::SetLoading(_) => "set-loading",
            Action::UpdateTokens(_) => "update-tokens",
            Action::ClearAuth => "clear-auth",
            Action::UpdateUser(_) => "update-user",
        }
    }
}

/// Applies an action to the state and returns the persistence it requires.
pub fn reduce(state: &mut AuthState, action: Action) -> Persist {
    match action {
        Action::LoginPending => {
            state.is_loading = true;
            state.error = None;
            Persist::None
        }
        Action::SignupPending => {
            state.is_loading = true;
            state.error = None;
            state.email_verification_sent = false;
            Persist::None
        }
        Action::LoginFulfilled(response) => {
            sign_in(state, response);
            Persist::Session
        }
        Action::SignupFulfilled(response) => {
            state.email_verification_sent = response.email_sent;
            sign_in(state, response);
            Persist::Session
        }
        Action::LoginRejected(error) => {
            reject_sign_in(state, error);
            Persist::Clear
        }
        Action::SignupRejected(error) => {
            reject_sign_in(state, error);
            state.email_verification_sent = false;
            Persist::Clear
        }

        Action::LogoutPending | Action::VerifyPending | Action::RefreshPending => {
            state.is_loading = true;
            Persist::None
        }
        Action::LogoutFinished => {
            state.sign_out();
            state.is_loading = false;
            Persist::Clear
        }

        Action::VerifyFulfilled(user) => {
            state.is_loading = false;
            // A user without tokens would be a half session.
            if state.tokens.is_none() {
                return Persist::None;
            }
            state.user = Some(user);
            state.is_authenticated = true;
            state.error = None;
            Persist::User
        }
        Action::VerifyRejected => {
            state.sign_out();
            state.is_loading = false;
            Persist::Clear
        }

        Action::RefreshFulfilled(refreshed) => {
            state.is_loading = false;
            match state.tokens.as_mut() {
                Some(tokens) => {
                    tokens.apply_refresh(&refreshed);
                    Persist::Session
                }
                None => Persist::None,
            }
        }
        Action::RefreshRejected => {
            state.sign_out();
            state.is_loading = false;
            state.error = Some(AuthError::session_expired());
            Persist::Clear
        }

        Action::ForgotPasswordPending => {
            state.is_loading = true;
            state.error = None;
            state.password_reset_sent = false;
            Persist::None
        }
        Action::ForgotPasswordFulfilled => {
            state.is_loading = false;
            state.password_reset_sent = true;
            state.error = None;
            Persist::None
        }
        Action::ForgotPasswordRejected(error) => {
            state.is_loading = false;
            state.password_reset_sent = false;
            state.error = Some(error);
            Persist::None
        }

        Action::ResetPasswordPending
        | Action::VerifyEmailPending
        | Action::ResendVerificationPending => {
            state.is_loading = true;
            state.error = None;
            Persist::None
        }
        Action::ResetPasswordFulfilled => {
            state.is_loading = false;
            state.password_reset_sent = false;
            Persist::None
        }
        Action::VerifyEmailFulfilled => {
            state.is_loading = false;
            match state.user.as_mut() {
                Some(user) => {
                    user.is_verified = true;
                    Persist::User
                }
                None => Persist::None,
            }
        }
        Action::ResendVerificationFulfilled => {
            state.is_loading = false;
            state.email_verification_sent = true;
            Persist::None
        }
        Action::ResetPasswordRejected(error)
        | Action::VerifyEmailRejected(error)
        | Action::ResendVerificationRejected(error) => {
            state.is_loading = false;
            state.error = Some(error);
            Persist::None
        }

        Action::ClearError => {
            state.error = None;
            Persist::None
        }
        Action::SetLoading(loading) => {
            state.is_loading = loading;
            Persist::None
        }
        Action::UpdateTokens(tokens) => {
            state.tokens = Some(tokens);
            Persist::Session
        }
        Action::ClearAuth => {
            state.sign_out();
            Persist::Clear
        }
        Action::UpdateUser(patch) => match state.user.as_mut() {
            Some(user) => {
                user.apply_patch(patch);
                Persist::User
            }
            None => Persist::None,
        },
    }
}

fn sign_in(state: &mut AuthState, response: AuthResponse) {
    state.user = Some(response.user);
    state.tokens = Some(response.tokens);
    state.is_authenticated = true;
    state.is_loading = false;
    state.error = None;
}

fn reject_sign_in(state: &mut AuthState, error: AuthError) {
    state.user = None;
    state.tokens = None;
    state.is_authenticated = false;
    state.is_loading = false;
    state.error = Some(error);
}
