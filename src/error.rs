//! Error types shared by the client, pagination walkers and codecs.
//!
//! Every failure surfaces as a [`PagerDutyError`]. Callers branch on
//! [`PagerDutyError::kind`] rather than on message text; the retry executor
//! uses [`PagerDutyError::is_retryable`] to decide whether to reissue a
//! request.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::custom_fields::ShapeError;

/// Extension trait to convert string-like types into `Box<str>`.
///
/// Error variants store context as `Box<str>` to keep the enum compact.
pub(crate) trait BoxedStr {
    fn boxed(self) -> Box<str>;
}

impl BoxedStr for String {
    fn boxed(self) -> Box<str> {
        self.into_boxed_str()
    }
}

impl BoxedStr for &str {
    fn boxed(self) -> Box<str> {
        self.into()
    }
}

/// Classification attached to every [`PagerDutyError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Connection reset, broken pipe, timeout or similar transient I/O.
    Network,
    /// Any other transport failure (redirect loops, invalid URLs, TLS setup).
    Transport,
    /// The response body could not be read in full.
    BodyRead,
    /// HTTP 429.
    RateLimited,
    /// HTTP 5xx.
    Server,
    /// A 2xx body that is not well-formed JSON.
    Decode,
    /// HTTP 4xx other than 429.
    Client,
    /// Well-formed JSON whose shape does not match the target type.
    Schema,
    /// Every permitted attempt failed with a retryable error.
    RetriesExhausted,
    /// The call was cancelled or exceeded its total deadline.
    Cancelled,
    /// A pagination walk was abandoned because the server misbehaved.
    Pagination,
    /// The request could not be built.
    InvalidRequest,
    /// Configuration or credentials could not be loaded.
    Config,
    /// Local file I/O failed.
    Io,
}

impl ErrorKind {
    /// Whether reissuing the same request may succeed.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::Network | Self::BodyRead | Self::RateLimited | Self::Server | Self::Decode
        )
    }
}

/// Nested detail attached to an API error.
///
/// PagerDuty sends either a list of messages or a map of field names to
/// messages. Anything else is kept verbatim.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ApiErrorDetails {
    List(Vec<String>),
    Fields(BTreeMap<String, Vec<String>>),
    Other(serde_json::Value),
}

impl fmt::Display for ApiErrorDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List(items) => f.write_str(&items.join(", ")),
            Self::Fields(fields) => {
                let mut first = true;
                for (field, messages) in fields {
                    if !first {
                        f.write_str("; ")?;
                    }
                    first = false;
                    write!(f, "{field}: {}", messages.join(", "))?;
                }
                Ok(())
            }
            Self::Other(value) => write!(f, "{value}"),
        }
    }
}

/// Structured error body returned by the PagerDuty API.
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
pub struct ApiError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub errors: Option<ApiErrorDetails>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)?;
        if let Some(details) = &self.errors {
            write!(f, ": {details}")?;
        }
        Ok(())
    }
}

/// Details of a non-2xx response.
#[derive(Debug, Clone)]
pub struct HttpFailure {
    pub method: Box<str>,
    pub url: Box<str>,
    pub status: u16,
    /// Decoded error body, when the body had the documented shape.
    pub api: Option<ApiError>,
    /// Backoff requested by rate-limit headers.
    pub retry_after: Option<Duration>,
    pub snippet: Box<str>,
}

impl fmt::Display for HttpFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.api {
            Some(api) => write!(
                f,
                "{} API call to {} failed with status {}: {api}",
                self.method, self.url, self.status
            ),
            None => write!(
                f,
                "{} API call to {} failed: {}",
                self.method,
                self.url,
                status_text(self.status)
            ),
        }
    }
}

fn status_text(status: u16) -> String {
    reqwest::StatusCode::from_u16(status).map_or_else(
        |_| status.to_string(),
        |code| match code.canonical_reason() {
            Some(reason) => format!("{status} {reason}"),
            None => status.to_string(),
        },
    )
}

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum PagerDutyError {
    #[error("request failed when running {context}: {source}")]
    Transport {
        context: Box<str>,
        /// Set by the classifier when the failure looks transient.
        retryable: bool,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to read response body for {context}: {source}")]
    BodyRead {
        context: Box<str>,
        #[source]
        source: reqwest::Error,
    },
    #[error("{0}")]
    Http(Box<HttpFailure>),
    #[error("malformed response (status {status}): {message} | snippet: {snippet}")]
    Decode {
        status: u16,
        message: Box<str>,
        snippet: Box<str>,
    },
    #[error("unexpected response shape (status {status}): {message} | snippet: {snippet}")]
    Schema {
        status: u16,
        message: Box<str>,
        snippet: Box<str>,
    },
    #[error(transparent)]
    Shape(#[from] ShapeError),
    #[error("API error despite {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: usize,
        #[source]
        last: Box<PagerDutyError>,
    },
    #[error("request cancelled: {0}")]
    Cancelled(Box<str>),
    #[error("pagination aborted: {0}")]
    Pagination(Box<str>),
    #[error("invalid request: {0}")]
    InvalidRequest(Box<str>),
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
    #[error("configuration error: {0}")]
    Config(#[source] BoxError),
    #[error("io error: {0}")]
    Io(#[source] Box<std::io::Error>),
}

impl PagerDutyError {
    /// Return the classification of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport { retryable, .. } => {
                if *retryable {
                    ErrorKind::Network
                } else {
                    ErrorKind::Transport
                }
            }
            Self::BodyRead { .. } => ErrorKind::BodyRead,
            Self::Http(failure) => match failure.status {
                429 => ErrorKind::RateLimited,
                s if s >= 500 => ErrorKind::Server,
                _ => ErrorKind::Client,
            },
            Self::Decode { .. } => ErrorKind::Decode,
            Self::Schema { .. } | Self::Shape(_) => ErrorKind::Schema,
            Self::RetriesExhausted { .. } => ErrorKind::RetriesExhausted,
            Self::Cancelled(_) => ErrorKind::Cancelled,
            Self::Pagination(_) => ErrorKind::Pagination,
            Self::InvalidRequest(_) => ErrorKind::InvalidRequest,
            Self::HttpClient(_) | Self::Config(_) => ErrorKind::Config,
            Self::Io(_) => ErrorKind::Io,
        }
    }

    /// Whether reissuing the same request may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }

    /// HTTP status of the failing response, if any.
    ///
    /// Looks through [`PagerDutyError::RetriesExhausted`] to the last error.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http(failure) => Some(failure.status),
            Self::Decode { status, .. } | Self::Schema { status, .. } => Some(*status),
            Self::RetriesExhausted { last, .. } => last.status(),
            _ => None,
        }
    }

    /// Structured API error decoded from the response body, if any.
    #[must_use]
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Http(failure) => failure.api.as_ref(),
            Self::RetriesExhausted { last, .. } => last.api_error(),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PagerDutyError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(Box::new(e))
    }
}
