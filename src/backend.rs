//! Auth endpoints behind a trait, so the session state machine can be driven
//! by a mock in tests and by [`HttpAuthBackend`] everywhere else.

use async_trait::async_trait;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::types::{Credentials, NewUser, TokenResponse, User};

pub const LOGIN_PATH: &str = "/token";
pub const USERS_PATH: &str = "/users";
pub const CURRENT_USER_PATH: &str = "/users/me";

/// The three calls the session façade makes.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Exchange credentials for a token.
    async fn login(&self, credentials: &Credentials) -> Result<TokenResponse, ApiError>;

    /// Create an account. Does not log in.
    async fn register(&self, new_user: &NewUser) -> Result<User, ApiError>;

    /// Resolve whoever the currently stored token belongs to.
    async fn current_user(&self) -> Result<User, ApiError>;
}

/// [`AuthBackend`] over the authenticated HTTP client.
#[derive(Clone, Debug)]
pub struct HttpAuthBackend {
    client: ApiClient,
}

impl HttpAuthBackend {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    #[must_use]
    pub fn client(&self) -> &ApiClient {
        &self.client
    }
}

#[async_trait]
impl AuthBackend for HttpAuthBackend {
    async fn login(&self, credentials: &Credentials) -> Result<TokenResponse, ApiError> {
        self.client.post_json(LOGIN_PATH, credentials).await
    }

    async fn register(&self, new_user: &NewUser) -> Result<User, ApiError> {
        self.client.post_json(USERS_PATH, new_user).await
    }

    async fn current_user(&self) -> Result<User, ApiError> {
        self.client.get_json(CURRENT_USER_PATH).await
    }
}
