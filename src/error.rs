//! Error types for the session client.
//!
//! ERROR HANDLING
//! ==============
//! Lower layers return these as `Result`s. The auth façade collapses them
//! into a boolean plus a logged reason, so none of them is fatal to a caller
//! that only wants "did it work".

use std::path::PathBuf;

use serde::Deserialize;

// =============================================================================
// STORAGE
// =============================================================================

/// Failures reading or writing the persisted key-value slot.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The backing file could not be read or written.
    #[error("storage io failed for {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The backing file exists but does not hold a JSON string map.
    #[error("storage file {} is corrupt: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A previous writer panicked while holding the slot lock.
    #[error("storage lock poisoned")]
    Poisoned,
}

// =============================================================================
// CONFIG
// =============================================================================

/// Invalid client configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The API URL is empty or not http(s).
    #[error("invalid API URL: {0:?} (expected http:// or https://)")]
    InvalidApiUrl(String),

    /// No platform data directory could be determined for the default state file.
    #[error("no data directory available; set CATALOG_STATE_FILE")]
    NoDataDir,
}

// =============================================================================
// API
// =============================================================================

/// Failures talking to the backend.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Transport-level failure (connect, TLS, body read).
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status.
    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body did not match the expected shape.
    #[error("response decode failed: {0}")]
    Decode(String),

    /// The request was rejected locally before it was sent.
    #[error("invalid request: {0}")]
    Invalid(String),

    /// The token could not be persisted or removed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Deserialize)]
struct DetailBody {
    detail: String,
}

impl ApiError {
    /// HTTP status for `Status` errors.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// The backend's `{"detail": "..."}` message, when the body carries one.
    /// Any other body shape means there is no detail; the raw body stays in
    /// the error's `Display`.
    #[must_use]
    pub fn detail(&self) -> Option<String> {
        let Self::Status { body, .. } = self else {
            return None;
        };
        serde_json::from_str::<DetailBody>(body).ok().map(|parsed| parsed.detail)
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
