//! Client configuration parsed from environment variables.

use std::path::PathBuf;

use directories::ProjectDirs;

use crate::error::ConfigError;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const STATE_FILE_NAME: &str = "session.json";

pub const API_URL_ENV: &str = "CATALOG_API_URL";
pub const STATE_FILE_ENV: &str = "CATALOG_STATE_FILE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend base URL without a trailing slash.
    pub api_url: String,
    /// File backing the persisted token slot.
    pub state_file: PathBuf,
}

impl ClientConfig {
    /// Build config from explicit values, falling back to defaults for `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API URL is not http(s), or if no state file is
    /// given and the platform has no data directory.
    pub fn new(api_url: Option<&str>, state_file: Option<PathBuf>) -> Result<Self, ConfigError> {
        let api_url = normalize_api_url(api_url.unwrap_or(DEFAULT_API_URL))?;
        let state_file = match state_file {
            Some(path) => path,
            None => default_state_file()?,
        };
        Ok(Self { api_url, state_file })
    }

    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `CATALOG_API_URL`: default `http://localhost:8000`
    /// - `CATALOG_STATE_FILE`: default `<data dir>/session.json`
    ///
    /// # Errors
    ///
    /// See [`ClientConfig::new`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_url = env_non_empty(API_URL_ENV);
        let state_file = env_non_empty(STATE_FILE_ENV).map(PathBuf::from);
        Self::new(api_url.as_deref(), state_file)
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => Some(value.trim().to_owned()),
        _ => None,
    }
}

pub(crate) fn normalize_api_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let has_host = trimmed
        .strip_prefix("http://")
        .or_else(|| trimmed.strip_prefix("https://"))
        .is_some_and(|rest| !rest.is_empty());
    if !has_host {
        return Err(ConfigError::InvalidApiUrl(raw.to_owned()));
    }
    Ok(trimmed.to_owned())
}

fn default_state_file() -> Result<PathBuf, ConfigError> {
    let dirs = ProjectDirs::from("com", "enterprise-demo", "catalog").ok_or(ConfigError::NoDataDir)?;
    Ok(dirs.data_dir().join(STATE_FILE_NAME))
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
