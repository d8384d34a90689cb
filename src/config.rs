//! Layered client configuration.
//!
//! Values are merged with `figment` in increasing priority: built-in
//! defaults, a TOML file, then `PAGERDUTY_*` environment variables. Callers
//! such as the CLI may add one more layer of explicit overrides on top.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use crate::api::client::{DEFAULT_BASE_URL, DEFAULT_USER_AGENT};
use crate::api::{BaseUrl, Client, RetryConfig, Token};
use crate::credentials::Credentials;
use crate::error::PagerDutyError;

/// Directory name used under the XDG base directories.
pub const APP_NAME: &str = "pagerduty";
/// File name searched for in the XDG config directories.
pub const CONFIG_FILE: &str = "config.toml";
/// Prefix shared by every configuration environment variable.
pub const ENV_PREFIX: &str = "PAGERDUTY_";

/// Settings used to build a [`Client`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    /// API token. Takes precedence over the credentials file.
    pub token: Option<String>,
    /// Credentials profile consulted when no token is set.
    pub profile: String,
    pub user_agent: Option<String>,
    /// Append a JSON transcript of every attempt to this file.
    pub debug_log: Option<PathBuf>,
    /// Per-request timeout in seconds.
    pub http_timeout: u64,
    /// Connection timeout in seconds.
    pub connect_timeout: u64,
    pub max_retries: usize,
    /// Delay between attempts in seconds.
    pub retry_delay: u64,
    /// Credentials file replacing the XDG default.
    pub credentials: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let retry = RetryConfig::default();
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            profile: "default".to_string(),
            user_agent: None,
            debug_log: None,
            http_timeout: retry.request_timeout.as_secs(),
            connect_timeout: retry.connect_timeout.as_secs(),
            max_retries: retry.max_retries,
            retry_delay: retry.delay.as_secs(),
            credentials: None,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("profile", &self.profile)
            .field("user_agent", &self.user_agent)
            .field("debug_log", &self.debug_log)
            .field("http_timeout", &self.http_timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("max_retries", &self.max_retries)
            .field("retry_delay", &self.retry_delay)
            .field("credentials", &self.credentials)
            .finish()
    }
}

fn config_error(msg: impl Into<String>) -> PagerDutyError {
    PagerDutyError::Config(msg.into().into())
}

impl ClientConfig {
    /// Build the layered provider without extracting it.
    ///
    /// An explicit `path` must exist. Without one, the first
    /// `pagerduty/config.toml` found in the XDG config directories is used,
    /// if any.
    ///
    /// # Errors
    ///
    /// Returns [`PagerDutyError::Config`] when `path` does not exist.
    pub fn figment(path: Option<&Path>) -> Result<Figment, PagerDutyError> {
        let file = match path {
            Some(p) if p.is_file() => Some(p.to_path_buf()),
            Some(p) => {
                return Err(config_error(format!(
                    "config file {} does not exist",
                    p.display()
                )));
            }
            None => xdg::BaseDirectories::with_prefix(APP_NAME).find_config_file(CONFIG_FILE),
        };
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(file) = file {
            figment = figment.merge(Toml::file(file));
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX)))
    }

    /// Load configuration from defaults, file and environment.
    ///
    /// # Errors
    ///
    /// Returns [`PagerDutyError::Config`] if the file is missing or cannot
    /// be parsed, or a value has the wrong type.
    pub fn load(path: Option<&Path>) -> Result<Self, PagerDutyError> {
        Self::figment(path)?
            .extract()
            .map_err(|e| PagerDutyError::Config(Box::new(e)))
    }

    /// Load configuration with `overrides` applied above every other layer.
    ///
    /// Only the fields `overrides` serialises are replaced, so an override
    /// struct should skip unset values.
    ///
    /// # Errors
    ///
    /// As for [`ClientConfig::load`].
    pub fn load_with<T: Serialize>(
        path: Option<&Path>,
        overrides: &T,
    ) -> Result<Self, PagerDutyError> {
        Self::figment(path)?
            .merge(Serialized::defaults(overrides))
            .extract()
            .map_err(|e| PagerDutyError::Config(Box::new(e)))
    }

    /// Retry policy described by this configuration.
    #[must_use]
    pub fn retry(&self) -> RetryConfig {
        RetryConfig {
            max_retries: self.max_retries,
            delay: Duration::from_secs(self.retry_delay),
            request_timeout: Duration::from_secs(self.http_timeout),
            connect_timeout: Duration::from_secs(self.connect_timeout),
            ..RetryConfig::default()
        }
    }

    /// Pick the token to authenticate with.
    ///
    /// A non-empty `token` wins; otherwise the configured profile is read
    /// from the credentials file.
    ///
    /// # Errors
    ///
    /// Returns [`PagerDutyError::Config`] when neither source yields a token
    /// or the credentials file cannot be read.
    pub fn resolve_token(&self) -> Result<Token, PagerDutyError> {
        if let Some(token) = self.token.as_deref().filter(|t| !t.trim().is_empty()) {
            return Ok(Token::new(token));
        }
        let path = self
            .credentials
            .clone()
            .or_else(Credentials::default_path);
        let Some(path) = path else {
            return Err(config_error(format!(
                "no API token configured and no credentials file found for profile '{}'",
                self.profile
            )));
        };
        let creds = Credentials::load(&path)?;
        creds.token(&self.profile).map(Token::new).ok_or_else(|| {
            config_error(format!(
                "profile '{}' not found in {}",
                self.profile,
                path.display()
            ))
        })
    }
}

impl Client {
    /// Build a client from layered configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PagerDutyError::Config`] when no token can be resolved and
    /// otherwise as for [`Client::with_endpoint_retry`].
    pub fn from_config(config: &ClientConfig) -> Result<Self, PagerDutyError> {
        let token = config.resolve_token()?;
        Self::build(
            &token,
            BaseUrl::new(config.base_url.clone()),
            config.debug_log.clone(),
            config.retry(),
            config.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT),
        )
    }
}
