//! Client-side authenticated session for the product catalog backend.
//!
//! SYSTEM CONTEXT
//! ==============
//! The backend issues opaque bearer tokens from `POST /token`, creates
//! accounts at `POST /users`, and answers "who am I" at `GET /users/me`.
//! This crate keeps the token in a durable slot, attaches it to every
//! outbound request, resolves the current user whenever the token changes,
//! and exposes login/register/logout through [`AuthSession`].
//!
//! ```text
//! TokenStore <-- ApiClient <-- HttpAuthBackend <-- AuthSession
//!     ^              ^
//!     |              +-------- CatalogApi
//!     +--- shared handle ------------+
//! ```

pub mod backend;
pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod session;
pub mod token_store;
pub mod types;

pub use backend::{AuthBackend, HttpAuthBackend};
pub use catalog::{CatalogApi, HealthStatus, Product, ProductDraft, ProductFilter, ProductUpdate};
pub use client::ApiClient;
pub use config::ClientConfig;
pub use error::{ApiError, ConfigError, StorageError};
pub use session::{AuthSession, SessionState};
pub use token_store::{FileStore, KeyValueStore, MemoryStore, TokenStore};
pub use types::{Credentials, NewUser, Token, TokenResponse, User};
