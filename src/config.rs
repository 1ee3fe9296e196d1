//! Session configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use std::path::PathBuf;

pub const DEFAULT_API_URL: &str = "http://localhost:8081/api/v1";
pub const DEFAULT_SESSION_DIR: &str = ".campus-connect";

pub const API_URL_VAR: &str = "CAMPUS_API_URL";
pub const SESSION_DIR_VAR: &str = "CAMPUS_SESSION_DIR";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid API URL '{url}': {reason}")]
    InvalidApiUrl { url: String, reason: String },
    #[error("session directory must not be empty")]
    EmptySessionDir,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// API origin plus path prefix, without a trailing slash.
    pub api_url: String,
    /// Directory holding the durable session slots.
    pub session_dir: PathBuf,
}

impl SessionConfig {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `CAMPUS_API_URL`: default `http://localhost:8081/api/v1`
    /// - `CAMPUS_SESSION_DIR`: default `.campus-connect`
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the URL is not an absolute http(s) URL or
    /// the session directory is empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_parts(
            std::env::var(API_URL_VAR).ok().as_deref(),
            std::env::var(SESSION_DIR_VAR).ok().as_deref(),
        )
    }

    /// Build typed config from optional raw values, applying defaults.
    ///
    /// # Errors
    ///
    /// See [`from_env`](Self::from_env).
    pub fn from_parts(api_url: Option<&str>, session_dir: Option<&str>) -> Result<Self, ConfigError> {
        let api_url = parse_api_url(api_url.unwrap_or(DEFAULT_API_URL))?;
        let session_dir = session_dir.unwrap_or(DEFAULT_SESSION_DIR).trim();
        if session_dir.is_empty() {
            return Err(ConfigError::EmptySessionDir);
        }
        Ok(Self { api_url, session_dir: PathBuf::from(session_dir) })
    }
}

fn parse_api_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let parsed = reqwest::Url::parse(trimmed)
        .map_err(|e| ConfigError::InvalidApiUrl { url: raw.to_owned(), reason: e.to_string() })?;
    match parsed.scheme() {
        "http" | "https" => Ok(trimmed.to_owned()),
        other => Err(ConfigError::InvalidApiUrl {
            url: raw.to_owned(),
            reason: format!("unsupported scheme '{other}'"),
        }),
    }
}
