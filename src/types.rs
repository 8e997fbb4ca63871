//! Wire types for the auth endpoints.
//!
//! Credentials and tokens redact themselves in `Debug` output so they can be
//! passed to `tracing` fields without leaking secrets.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

// =============================================================================
// TOKEN
// =============================================================================

/// Opaque bearer credential issued by the backend.
///
/// Expiry is server-defined and never inspected here.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(***)")
    }
}

/// `POST /token` response body.
#[derive(Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

impl fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"***")
            .field("token_type", &self.token_type)
            .finish()
    }
}

// =============================================================================
// REQUEST BODIES
// =============================================================================

/// `POST /token` request body.
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    #[must_use]
    pub fn new(username: &str, password: &str) -> Self {
        Self { username: username.to_owned(), password: password.to_owned() }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// `POST /users` request body.
#[derive(Clone, Serialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl NewUser {
    #[must_use]
    pub fn new(username: &str, email: &str, password: &str) -> Self {
        Self { username: username.to_owned(), email: email.to_owned(), password: password.to_owned() }
    }

    /// Cheap local checks mirroring what the backend will reject anyway.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Invalid` for an empty username or password, or an
    /// email without `@`.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.username.trim().is_empty() {
            return Err(ApiError::Invalid("username must not be empty".into()));
        }
        if self.password.is_empty() {
            return Err(ApiError::Invalid("password must not be empty".into()));
        }
        let well_formed = self
            .email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());
        if !well_formed {
            return Err(ApiError::Invalid(format!("invalid email address: {}", self.email)));
        }
        Ok(())
    }
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

// =============================================================================
// USER
// =============================================================================

/// Snapshot of the authenticated principal from `GET /users/me`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub disabled: bool,
    /// Any profile fields beyond the ones above.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
