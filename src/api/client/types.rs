//! Types used by the REST client.

use std::fmt;

use serde::Deserialize;

use crate::error::ApiError;

/// A PagerDuty REST API token.
///
/// `Debug` output never includes the secret.
#[derive(Clone)]
pub struct Token(String);

impl Token {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(<redacted>)")
    }
}

impl From<&str> for Token {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Token {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Base URL of the REST API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUrl(String);

impl BaseUrl {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BaseUrl {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<&String> for BaseUrl {
    fn from(s: &String) -> Self {
        Self(s.clone())
    }
}

impl From<String> for BaseUrl {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Default for BaseUrl {
    fn default() -> Self {
        Self(DEFAULT_BASE_URL.to_string())
    }
}

pub(crate) const DEFAULT_BASE_URL: &str = "https://api.pagerduty.com";
pub(crate) const DEFAULT_USER_AGENT: &str = concat!("pagerduty-rs/", env!("CARGO_PKG_VERSION"));
pub(crate) const ACCEPT_V2: &str = "application/vnd.pagerduty+json;version=2";

#[derive(Debug, Deserialize)]
pub(super) struct ErrorEnvelope {
    pub(super) error: ApiError,
}

#[derive(Debug, Deserialize)]
pub(super) struct AbilitiesEnvelope {
    pub(super) abilities: Vec<String>,
}
