//! Shared auth store.
//!
//! Runs auth operations against the client and funnels every outcome through
//! the reducer. Each dispatch takes a ticket from its lane's generation
//! counter when it starts; only the latest ticket of a lane may commit its
//! result, so an older request that resolves late cannot overwrite a newer one.
//! Session operations share one lane and every side flow has its own.
//! Logout always completes and supersedes any session operation in flight.

use std::sync::Arc;

use coreconnect_types::{
    AuthTokens, LoginCredentials, RefreshedToken, SignupCredentials, User, UserPatch,
};
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

use super::reducer::{Action, Persist, reduce};
use super::AuthState;
use crate::auth::{AuthClient, AuthError, AuthResponse, mask_token};
use crate::token_store::{TokenRepository, TokenStore};

/// Dispatches in the same lane supersede each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lane {
    Session,
    ForgotPassword,
    ResetPassword,
    VerifyEmail,
    ResendVerification,
}

impl Lane {
    const COUNT: usize = 5;

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy)]
struct Ticket {
    lane: Lane,
    generation: u64,
}

struct Guarded {
    state: AuthState,
    generations: [u64; Lane::COUNT],
}

struct Inner<R> {
    client: AuthClient,
    tokens: TokenStore<R>,
    guarded: Mutex<Guarded>,
    tx: watch::Sender<AuthState>,
}

/// Handle to the application's auth state. Clones share the same state.
pub struct AuthStore<R> {
    inner: Arc<Inner<R>>,
}

impl<R> Clone for AuthStore<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: TokenRepository> AuthStore<R> {
    /// Creates the store, restoring any persisted session.
    pub fn new(client: AuthClient, repo: R) -> Self {
        let tokens = TokenStore::new(repo);
        let state = AuthState::hydrated(tokens.hydrate());
        if let Some(user) = &state.user {
            debug!(user_id = %user.id, "restored session");
        }
        let (tx, _) = watch::channel(state.clone());

        Self {
            inner: Arc::new(Inner {
                client,
                tokens,
                guarded: Mutex::new(Guarded {
                    state,
                    generations: [0; Lane::COUNT],
                }),
                tx,
            }),
        }
    }

    /// Snapshot of the latest state.
    pub fn state(&self) -> AuthState {
        self.inner.tx.borrow().clone()
    }

    /// Receiver notified after every transition.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.inner.tx.subscribe()
    }

    /// Signs in and stores the session.
    ///
    /// # Errors
    /// Returns the client error, or `Superseded` if a newer session dispatch or a
    /// logout started.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<AuthResponse, AuthError> {
        let (ticket, _) = self.begin(Lane::Session, Action::LoginPending).await;
        match self.inner.client.login(credentials).await {
            Ok(response) => {
                self.finish(ticket, Action::LoginFulfilled(response.clone()))
                    .await?;
                Ok(response)
            }
            Err(err) => {
                self.finish(ticket, Action::LoginRejected(err.clone()))
                    .await?;
                Err(err)
            }
        }
    }

    /// Registers a new account and signs in.
    ///
    /// # Errors
    /// Returns the client error, or `Superseded` if a newer session dispatch or a
    /// logout started.
    pub async fn signup(&self, credentials: &SignupCredentials) -> Result<AuthResponse, AuthError> {
        let (ticket, _) = self.begin(Lane::Session, Action::SignupPending).await;
        match self.inner.client.signup(credentials).await {
            Ok(response) => {
                self.finish(ticket, Action::SignupFulfilled(response.clone()))
                    .await?;
                Ok(response)
            }
            Err(err) => {
                self.finish(ticket, Action::SignupRejected(err.clone()))
                    .await?;
                Err(err)
            }
        }
    }

    /// Ends the session on the server (best effort) and locally.
    ///
    /// The local session is always cleared, whatever the server answers.
    pub async fn logout(&self) {
        let (_, state) = self.begin(Lane::Session, Action::LogoutPending).await;
        self.inner.client.logout(state.tokens.as_ref()).await;
        self.teardown().await;
        info!("logged out");
    }

    /// Re-validates the held access token and refreshes the user.
    ///
    /// Any failure signs the client out without recording an error.
    ///
    /// # Errors
    /// Returns the client error, or `Superseded` if a newer session dispatch or a
    /// logout started.
    pub async fn verify_token(&self) -> Result<User, AuthError> {
        let (ticket, state) = self.begin(Lane::Session, Action::VerifyPending).await;
        match self.inner.client.verify_token(state.access_token()).await {
            Ok(user) => {
                self.finish(ticket, Action::VerifyFulfilled(user.clone()))
                    .await?;
                Ok(user)
            }
            Err(err) => {
                debug!(error = %err, "token verification failed");
                self.finish(ticket, Action::VerifyRejected).await?;
                Err(err)
            }
        }
    }

    /// Exchanges the refresh token for a new access token.
    ///
    /// A rejected refresh ends the session.
    ///
    /// # Errors
    /// Returns the client error, or `Superseded` if a newer session dispatch or a
    /// logout started.
    pub async fn refresh_token(&self) -> Result<RefreshedToken, AuthError> {
        let (ticket, state) = self.begin(Lane::Session, Action::RefreshPending).await;
        match self.inner.client.refresh_token(state.refresh_token()).await {
            Ok(refreshed) => {
                debug!(token = %mask_token(&refreshed.access_token), "access token refreshed");
                self.finish(ticket, Action::RefreshFulfilled(refreshed.clone()))
                    .await?;
                Ok(refreshed)
            }
            Err(err) => {
                warn!(error = %err, "refresh rejected, ending session");
                self.finish(ticket, Action::RefreshRejected).await?;
                Err(err)
            }
        }
    }

    /// Requests a password reset email.
    ///
    /// # Errors
    /// Returns the client error, or `Superseded` if a newer request of the same kind
    /// started.
    pub async fn forgot_password(&self, email: &str) -> Result<(), AuthError> {
        let (ticket, _) = self.begin(Lane::ForgotPassword, Action::ForgotPasswordPending).await;
        let result = self.inner.client.forgot_password(email).await;
        self.settle(
            ticket,
            result,
            Action::ForgotPasswordFulfilled,
            Action::ForgotPasswordRejected,
        )
        .await
    }

    /// Sets a new password using a reset token.
    ///
    /// # Errors
    /// Returns the client error, or `Superseded` if a newer request of the same kind
    /// started.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AuthError> {
        let (ticket, _) = self.begin(Lane::ResetPassword, Action::ResetPasswordPending).await;
        let result = self.inner.client.reset_password(token, new_password).await;
        self.settle(
            ticket,
            result,
            Action::ResetPasswordFulfilled,
            Action::ResetPasswordRejected,
        )
        .await
    }

    /// Confirms an email address.
    ///
    /// # Errors
    /// Returns the client error, or `Superseded` if a newer request of the same kind
    /// started.
    pub async fn verify_email(&self, token: &str) -> Result<(), AuthError> {
        let (ticket, _) = self.begin(Lane::VerifyEmail, Action::VerifyEmailPending).await;
        let result = self.inner.client.verify_email(token).await;
        self.settle(
            ticket,
            result,
            Action::VerifyEmailFulfilled,
            Action::VerifyEmailRejected,
        )
        .await
    }

    /// Sends the verification email again.
    ///
    /// # Errors
    /// Returns the client error, or `Superseded` if a newer request of the same kind
    /// started.
    pub async fn resend_verification(&self, email: &str) -> Result<(), AuthError> {
        let (ticket, _) = self
            .begin(Lane::ResendVerification, Action::ResendVerificationPending)
            .await;
        let result = self.inner.client.resend_verification(email).await;
        self.settle(
            ticket,
            result,
            Action::ResendVerificationFulfilled,
            Action::ResendVerificationRejected,
        )
        .await
    }

    pub async fn clear_error(&self) {
        self.apply(Action::ClearError).await;
    }

    pub async fn set_loading(&self, loading: bool) {
        self.apply(Action::SetLoading(loading)).await;
    }

    pub async fn update_tokens(&self, tokens: AuthTokens) {
        self.apply(Action::UpdateTokens(tokens)).await;
    }

    pub async fn clear_auth(&self) {
        self.apply(Action::ClearAuth).await;
    }

    pub async fn update_user(&self, patch: UserPatch) {
        self.apply(Action::UpdateUser(patch)).await;
    }

    /// Applies a pending action and takes a new ticket in `lane`.
    async fn begin(&self, lane: Lane, action: Action) -> (Ticket, AuthState) {
        let mut guarded = self.inner.guarded.lock().await;
        let generation = bump(&mut guarded.generations, lane);
        self.commit(&mut guarded.state, action);
        (Ticket { lane, generation }, guarded.state.clone())
    }

    /// Applies a terminal action if `ticket` is still the latest in its lane.
    async fn finish(&self, ticket: Ticket, action: Action) -> Result<(), AuthError> {
        let mut guarded = self.inner.guarded.lock().await;
        let latest = guarded.generations[ticket.lane.index()];
        if latest != ticket.generation {
            debug!(
                action = action.name(),
                lane = ?ticket.lane,
                ticket = ticket.generation,
                latest,
                "discarding superseded result"
            );
            return Err(AuthError::superseded(action.name()));
        }
        self.commit(&mut guarded.state, action);
        Ok(())
    }

    /// Finishes a logout. Session operations still in flight lose.
    async fn teardown(&self) {
        let mut guarded = self.inner.guarded.lock().await;
        bump(&mut guarded.generations, Lane::Session);
        self.commit(&mut guarded.state, Action::LogoutFinished);
    }

    async fn settle(
        &self,
        ticket: Ticket,
        result: Result<(), AuthError>,
        fulfilled: Action,
        rejected: fn(AuthError) -> Action,
    ) -> Result<(), AuthError> {
        match result {
            Ok(()) => self.finish(ticket, fulfilled).await,
            Err(err) => {
                self.finish(ticket, rejected(err.clone())).await?;
                Err(err)
            }
        }
    }

    /// Applies a synchronous action outside the dispatch lifecycle.
    async fn apply(&self, action: Action) {
        let mut guarded = self.inner.guarded.lock().await;
        self.commit(&mut guarded.state, action);
    }

    /// Reduces, persists and publishes. Runs under the state lock.
    fn commit(&self, state: &mut AuthState, action: Action) {
        let name = action.name();
        let persist = reduce(state, action);
        self.persist(state, persist);
        debug!(action = name, phase = ?state.phase(), "auth transition");
        self.inner.tx.send_replace(state.clone());
    }

    /// Storage failures are logged and never fail the transition.
    fn persist(&self, state: &AuthState, persist: Persist) {
        let result = match persist {
            Persist::None => return,
            Persist::Session => match (&state.tokens, &state.user) {
                (Some(tokens), Some(user)) => self.inner.tokens.set(tokens, user),
                _ => {
                    debug!("incomplete session, nothing persisted");
                    return;
                }
            },
            Persist::User => match &state.user {
                Some(user) => self.inner.tokens.set_user(user),
                None => return,
            },
            Persist::Clear => self.inner.tokens.clear(),
        };

        if let Err(err) = result {
            warn!(error = %format!("{err:#}"), ?persist, "failed to update stored session");
        }
    }
}

fn bump(generations: &mut [u64; Lane::COUNT], lane: Lane) -> u64 {
    let slot = &mut generations[lane.index()];
    *slot += 1;
    *slot
}
