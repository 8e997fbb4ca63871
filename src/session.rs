//! Auth session façade.
//!
//! SYSTEM CONTEXT
//! ==============
//! `AuthSession` is the only entry point callers use for login state. It is
//! constructed explicitly at startup and passed by handle; there is no global
//! session. Mutating calls take `&mut self`, so a second login cannot start
//! while one is in flight on the same session.
//!
//! STATE MACHINE
//! =============
//! ```text
//! Anonymous --login ok--> Resolving --fetch ok--> Authenticated
//!                         Resolving --fetch fail--> Invalid --auto--> Anonymous
//! Authenticated --logout--> Anonymous
//! ```
//! A session built over a store that already holds a token starts in
//! `Resolving`; [`AuthSession::resolve`] settles it. `Invalid` is transient
//! and never observable after a call returns.
//!
//! ERROR HANDLING
//! ==============
//! A failed current-user fetch with a token present is the only automatic
//! logout. Transport errors and server rejections are treated alike. Nothing
//! is retried.

use crate::backend::{AuthBackend, HttpAuthBackend};
use crate::client::ApiClient;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::token_store::TokenStore;
use crate::types::{Credentials, NewUser, Token, User};

/// Message shown for any failed login.
pub const LOGIN_FAILED_MESSAGE: &str = "Invalid username or password";
/// Message shown when the credential could not be saved locally.
pub const STORAGE_FAILED_MESSAGE: &str = "Could not save the session; check the state file";
/// Fallback message for a failed registration without a backend detail.
pub const REGISTER_FAILED_MESSAGE: &str = "Registration failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No token.
    Anonymous,
    /// Token present, current-user fetch pending.
    Resolving,
    /// Token and current user present.
    Authenticated,
    /// Token present but the user fetch failed; collapses to `Anonymous`.
    Invalid,
}

impl SessionState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Anonymous => "anonymous",
            Self::Resolving => "resolving",
            Self::Authenticated => "authenticated",
            Self::Invalid => "invalid",
        }
    }
}

pub struct AuthSession<B = HttpAuthBackend> {
    backend: B,
    tokens: TokenStore,
    user: Option<User>,
    state: SessionState,
}

impl AuthSession<HttpAuthBackend> {
    /// File-backed session over HTTP, as configured. Call
    /// [`AuthSession::resolve`] afterwards to settle a persisted token.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn connect(config: &ClientConfig) -> Result<Self, ApiError> {
        let tokens = TokenStore::open(&config.state_file);
        let client = ApiClient::from_config(config, tokens.clone())?;
        Ok(Self::new(HttpAuthBackend::new(client), tokens))
    }

    /// The authenticated client the session talks through.
    #[must_use]
    pub fn client(&self) -> &ApiClient {
        self.backend.client()
    }
}

impl<B: AuthBackend> AuthSession<B> {
    /// `tokens` must be the same store the backend's HTTP client reads.
    #[must_use]
    pub fn new(backend: B, tokens: TokenStore) -> Self {
        let state = if tokens.is_empty() { SessionState::Anonymous } else { SessionState::Resolving };
        Self { backend, tokens, user: None, state }
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// True iff the token store holds a token.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        !self.tokens.is_empty()
    }

    #[must_use]
    pub fn current_user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Derive the current user from the current token.
    ///
    /// No token: the user is cleared and the session is `Anonymous`. With a
    /// token, a fetch failure of any kind logs the session out.
    pub async fn resolve(&mut self) -> SessionState {
        if self.tokens.is_empty() {
            self.user = None;
            self.state = SessionState::Anonymous;
            return self.state;
        }

        self.user = None;
        self.state = SessionState::Resolving;
        match self.backend.current_user().await {
            Ok(user) => {
                tracing::info!(username = %user.username, "session resolved");
                self.accept(user);
            }
            Err(e) => self.invalidate(&e),
        }
        self.state
    }

    /// Exchange credentials for a token, store it, and fetch the user inline.
    ///
    /// # Errors
    ///
    /// Returns the login error with no state change, a storage error if the
    /// token cannot be persisted, or the user-fetch error after the session
    /// has been invalidated.
    pub async fn try_login(&mut self, username: &str, password: &str) -> Result<(), ApiError> {
        let credentials = Credentials::new(username, password);
        let response = self.backend.login(&credentials).await?;
        if !response.token_type.eq_ignore_ascii_case("bearer") {
            tracing::warn!(token_type = %response.token_type, "unexpected token type; using as bearer");
        }

        self.tokens.set(&Token::new(response.access_token))?;
        self.user = None;
        self.state = SessionState::Resolving;

        match self.backend.current_user().await {
            Ok(user) => {
                self.accept(user);
                tracing::info!(%username, "logged in");
                Ok(())
            }
            Err(e) => {
                self.invalidate(&e);
                Err(e)
            }
        }
    }

    /// Boolean façade over [`AuthSession::try_login`].
    pub async fn login(&mut self, username: &str, password: &str) -> bool {
        match self.try_login(username, password).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(%username, error = %e, "login failed");
                false
            }
        }
    }

    /// Create an account, then log in with the same username and password.
    ///
    /// # Errors
    ///
    /// Returns a validation or registration error with no state change, or
    /// whatever the follow-up login returns.
    pub async fn try_register(&mut self, username: &str, email: &str, password: &str) -> Result<(), ApiError> {
        let new_user = NewUser::new(username, email, password);
        new_user.validate()?;
        let created = self.backend.register(&new_user).await?;
        tracing::info!(username = %created.username, "registered");
        self.try_login(username, password).await
    }

    /// Boolean façade over [`AuthSession::try_register`].
    pub async fn register(&mut self, username: &str, email: &str, password: &str) -> bool {
        match self.try_register(username, email, password).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(%username, error = %e, "registration failed");
                false
            }
        }
    }

    /// Drop the token and the user. No backend call is made. If the store
    /// refuses the removal the token still reads as absent in this process.
    pub fn logout(&mut self) {
        if let Err(e) = self.tokens.clear() {
            tracing::error!(error = %e, "failed to clear persisted token");
        }
        if self.state != SessionState::Anonymous {
            tracing::info!("logged out");
        }
        self.user = None;
        self.state = SessionState::Anonymous;
    }

    fn accept(&mut self, user: User) {
        self.user = Some(user);
        self.state = SessionState::Authenticated;
    }

    fn invalidate(&mut self, error: &ApiError) {
        self.state = SessionState::Invalid;
        tracing::warn!(error = %error, "session invalid; logging out");
        self.logout();
    }
}

/// User-facing text for a failed login. Rejections and transport failures
/// read the same; a local storage failure does not blame the credentials.
#[must_use]
pub fn login_failure_message(error: &ApiError) -> &'static str {
    match error {
        ApiError::Storage(_) => STORAGE_FAILED_MESSAGE,
        _ => LOGIN_FAILED_MESSAGE,
    }
}

/// User-facing text for a failed registration.
#[must_use]
pub fn register_failure_message(error: &ApiError) -> String {
    match error {
        ApiError::Invalid(reason) => reason.clone(),
        other => other.detail().unwrap_or_else(|| REGISTER_FAILED_MESSAGE.to_owned()),
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
