//! Retry configuration and failure classification.
//!
//! Backoff is a fixed interval. A 429 response that carries rate-limit
//! headers replaces that interval with the server's reset time.

use std::error::Error as _;
use std::io;
use std::time::Duration;

use backon::ConstantBuilder;
use reqwest::header::{HeaderMap, RETRY_AFTER};

use crate::error::{ErrorKind, PagerDutyError};

/// PagerDuty's reset header, in seconds.
pub const RATELIMIT_RESET: &str = "ratelimit-reset";

/// Configuration for retrying failed requests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryConfig {
    /// Retries allowed after the first attempt.
    pub max_retries: usize,
    /// Fixed delay between attempts.
    pub delay: Duration,
    /// Timeout applied to each HTTP call.
    pub request_timeout: Duration,
    /// Timeout for establishing a connection.
    pub connect_timeout: Duration,
    /// Upper bound on a delay requested by rate-limit headers.
    pub max_rate_limit_delay: Duration,
    /// Cap on the wall-clock time of one logical call, retries included.
    pub total_timeout: Option<Duration>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 4,
            delay: Duration::from_secs(30),
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(45),
            max_rate_limit_delay: Duration::from_secs(60),
            total_timeout: None,
        }
    }
}

impl RetryConfig {
    /// Total attempts including the first.
    #[must_use]
    pub const fn attempts(&self) -> usize {
        self.max_retries.saturating_add(1)
    }
}

/// Build a constant backoff from the given configuration.
#[must_use]
pub fn build_retry_builder(config: &RetryConfig) -> ConstantBuilder {
    ConstantBuilder::default()
        .with_delay(config.delay)
        .with_max_times(config.max_retries)
}

/// Determine whether an error is transient and the request should be retried.
///
/// # Examples
/// ```
/// use pagerduty::PagerDutyError;
/// use pagerduty::api::should_retry;
///
/// let err = PagerDutyError::Cancelled("deadline".into());
/// assert!(!should_retry(&err));
/// ```
#[must_use]
pub fn should_retry(err: &PagerDutyError) -> bool {
    err.is_retryable()
}

/// Classify an HTTP status outside the 2xx range.
#[must_use]
pub const fn classify_status(status: u16) -> ErrorKind {
    match status {
        429 => ErrorKind::RateLimited,
        500.. => ErrorKind::Server,
        _ => ErrorKind::Client,
    }
}

fn is_transient_io(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::TimedOut
            | io::ErrorKind::Interrupted
            | io::ErrorKind::UnexpectedEof
    )
}

/// Decide whether a transport failure is worth retrying.
///
/// Timeouts and connection failures qualify, as does any error whose source
/// chain contains a transient I/O error such as a reset or broken pipe.
#[must_use]
pub fn classify_transport(err: &reqwest::Error) -> ErrorKind {
    if err.is_timeout() || err.is_connect() {
        return ErrorKind::Network;
    }
    let mut source = err.source();
    while let Some(inner) = source {
        if let Some(io_err) = inner.downcast_ref::<io::Error>() {
            if is_transient_io(io_err.kind()) {
                return ErrorKind::Network;
            }
        }
        source = inner.source();
    }
    if err.is_request() || err.is_body() {
        // hyper reports dropped connections as request errors without an io source
        return ErrorKind::Network;
    }
    ErrorKind::Transport
}

fn header_seconds(headers: &HeaderMap, name: impl reqwest::header::AsHeaderName) -> Option<Duration> {
    let raw = headers.get(name)?.to_str().ok()?.trim();
    if let Ok(secs) = raw.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    raw.parse::<f64>()
        .ok()
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
}

/// Delay requested by rate-limit headers, capped at `max`.
///
/// `ratelimit-reset` takes precedence over `retry-after`.
#[must_use]
pub fn rate_limit_delay(headers: &HeaderMap, max: Duration) -> Option<Duration> {
    header_seconds(headers, RATELIMIT_RESET)
        .or_else(|| header_seconds(headers, RETRY_AFTER))
        .map(|d| d.min(max))
}

/// Choose the delay before the next attempt.
///
/// Returns `fixed` unless `err` is a rate-limit response that named its own
/// reset time.
#[must_use]
pub fn next_delay(err: &PagerDutyError, fixed: Duration) -> Duration {
    match err {
        PagerDutyError::Http(failure) if failure.status == 429 => {
            failure.retry_after.unwrap_or(fixed)
        }
        _ => fixed,
    }
}
