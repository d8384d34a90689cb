//! REST client implementation and request orchestration.

mod helpers;
mod http;
mod pagination;
mod transcript;
mod types;

use std::fs::{File, OpenOptions};
use std::future::Future;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use backon::Retryable;
use log::{debug, error, warn};
use reqwest::header::HeaderMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::time::sleep;
use url::Url;

use self::helpers::{body_snippet, build_headers, decode_api_error};
use self::types::AbilitiesEnvelope;
use super::request::ApiRequest;
use super::retry::{
    RetryConfig, build_retry_builder, classify_transport, next_delay, rate_limit_delay,
    should_retry,
};
use crate::error::{BoxedStr, ErrorKind, HttpFailure, PagerDutyError};

pub use self::http::HttpResponse;
pub use self::types::{BaseUrl, Token};
pub(crate) use self::types::{DEFAULT_BASE_URL, DEFAULT_USER_AGENT};


/// Environment variable overriding the API base URL used by [`Client::new`].
pub const BASE_URL_ENV: &str = "PAGERDUTY_BASE_URL";

const TCP_KEEPALIVE: Duration = Duration::from_secs(40);
const MAX_IDLE_PER_HOST: usize = 500;

/// Client for the PagerDuty REST API.
///
/// The client owns a pooled HTTP connection, the default headers sent with
/// every request and the retry policy. All state is read-only after
/// construction so one client may serve concurrent callers.
pub struct Client {
    client: reqwest::Client,
    headers: HeaderMap,
    base_url: BaseUrl,
    transcript: Option<Mutex<BufWriter<File>>>,
    retry: RetryConfig,
}

impl Client {
    /// Create a client using the standard PagerDuty endpoint, or the one
    /// named by `PAGERDUTY_BASE_URL`.
    ///
    /// # Errors
    ///
    /// Returns [`PagerDutyError::InvalidRequest`] for an empty token and
    /// [`PagerDutyError::HttpClient`] if the HTTP client cannot be built.
    pub fn new(token: impl Into<Token>) -> Result<Self, PagerDutyError> {
        let endpoint = std::env::var(BASE_URL_ENV)
            .map(BaseUrl::new)
            .unwrap_or_default();
        Self::with_endpoint_retry(token, endpoint, None, RetryConfig::default())
    }

    /// Create a client targeting a custom API endpoint.
    ///
    /// The optional `transcript` path records each attempt for
    /// troubleshooting.
    ///
    /// # Errors
    ///
    /// Returns a [`PagerDutyError`] if the transcript file cannot be opened,
    /// the token is empty or the HTTP client cannot be built.
    pub fn with_endpoint(
        token: impl Into<Token>,
        endpoint: impl Into<BaseUrl>,
        transcript: Option<PathBuf>,
    ) -> Result<Self, PagerDutyError> {
        Self::with_endpoint_retry(token, endpoint, transcript, RetryConfig::default())
    }

    /// Create a client targeting a custom API endpoint with custom retry
    /// settings.
    ///
    /// # Errors
    ///
    /// Returns a [`PagerDutyError`] if the transcript file cannot be opened,
    /// the token is empty or the HTTP client cannot be built.
    pub fn with_endpoint_retry(
        token: impl Into<Token>,
        endpoint: impl Into<BaseUrl>,
        transcript: Option<PathBuf>,
        retry: RetryConfig,
    ) -> Result<Self, PagerDutyError> {
        Self::build(
            &token.into(),
            endpoint.into(),
            transcript,
            retry,
            DEFAULT_USER_AGENT,
        )
    }

    pub(crate) fn build(
        token: &Token,
        base_url: BaseUrl,
        transcript: Option<PathBuf>,
        retry: RetryConfig,
        user_agent: &str,
    ) -> Result<Self, PagerDutyError> {
        let headers = build_headers(token, user_agent)?;
        let transcript = transcript
            .map(|p| {
                OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(p)
                    .map(|file| Mutex::new(BufWriter::new(file)))
            })
            .transpose()
            .map_err(|e| PagerDutyError::Io(Box::new(e)))?;
        let client = reqwest::Client::builder()
            .connect_timeout(retry.connect_timeout)
            .timeout(retry.request_timeout)
            .tcp_keepalive(TCP_KEEPALIVE)
            .pool_max_idle_per_host(MAX_IDLE_PER_HOST)
            .build()
            .map_err(PagerDutyError::HttpClient)?;
        Ok(Self {
            client,
            headers,
            base_url,
            transcript,
            retry,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &BaseUrl {
        &self.base_url
    }

    #[must_use]
    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    /// Perform one attempt and classify its outcome.
    ///
    /// # Errors
    ///
    /// Returns [`PagerDutyError::Transport`] if the request could not be
    /// sent, [`PagerDutyError::BodyRead`] if the body was cut short and
    /// [`PagerDutyError::Http`] for any status outside 200-299.
    async fn execute_single_request(
        &self,
        req: &ApiRequest,
        url: &Url,
        attempt: usize,
    ) -> Result<HttpResponse, PagerDutyError> {
        let method = req.method();
        let context = || format!("{method} {url} (attempt {attempt})").boxed();
        debug!("{method} {url} attempt {attempt}");

        let mut builder = self
            .client
            .request(method.clone(), url.clone())
            .headers(self.headers.clone())
            .headers(req.headers().clone());
        if let Some(body) = req.body_json() {
            builder = builder.json(body);
        }
        let response = builder
            .send()
            .await
            .map_err(|e| PagerDutyError::Transport {
                context: context(),
                retryable: classify_transport(&e) == ErrorKind::Network,
                source: e,
            })?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| PagerDutyError::BodyRead {
                context: context(),
                source: e,
            })?;
        let resp = HttpResponse {
            status,
            headers,
            body,
        };
        self.log_transcript(req, url, attempt, &resp);
        if (200..300).contains(&status) {
            return Ok(resp);
        }

        let retry_after = if status == 429 {
            rate_limit_delay(&resp.headers, self.retry.max_rate_limit_delay)
        } else {
            None
        };
        let err = PagerDutyError::Http(Box::new(HttpFailure {
            method: method.as_str().boxed(),
            url: url.as_str().boxed(),
            status,
            api: decode_api_error(&resp.body),
            retry_after,
            snippet: body_snippet(&resp.body).boxed(),
        }));
        if !err.is_retryable() {
            error!("{err}");
        }
        Err(err)
    }

    /// Run `op` under the retry policy.
    ///
    /// `op` receives the one-based attempt number. A retryable error that
    /// survives every attempt is wrapped in
    /// [`PagerDutyError::RetriesExhausted`].
    async fn with_retry<T, F, Fut>(&self, mut op: F) -> Result<T, PagerDutyError>
    where
        F: FnMut(usize) -> Fut,
        Fut: Future<Output = Result<T, PagerDutyError>>,
    {
        let attempts = AtomicUsize::new(0);
        let run = (|| op(attempts.fetch_add(1, Ordering::Relaxed).saturating_add(1)))
            .retry(build_retry_builder(&self.retry))
            .sleep(sleep)
            .when(should_retry)
            .adjust(|err: &PagerDutyError, dur| dur.map(|d| next_delay(err, d)))
            .notify(|err: &PagerDutyError, dur| warn!("retrying after {dur:?}: {err}"));
        let result = match self.retry.total_timeout {
            Some(limit) => tokio::time::timeout(limit, run).await.map_err(|_| {
                PagerDutyError::Cancelled(format!("deadline of {limit:?} exceeded").boxed())
            })?,
            None => run.await,
        };
        match result {
            Err(err) if err.is_retryable() => {
                let attempts = attempts.load(Ordering::Relaxed);
                error!("giving up after {attempts} attempts: {err}");
                Err(PagerDutyError::RetriesExhausted {
                    attempts,
                    last: Box::new(err),
                })
            }
            other => other,
        }
    }

    /// Execute `req` and return the raw response.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error, or
    /// [`PagerDutyError::RetriesExhausted`] once every attempt failed with a
    /// retryable one.
    pub async fn execute(&self, req: ApiRequest) -> Result<HttpResponse, PagerDutyError> {
        let url = req.url(&self.base_url)?;
        let (req, url) = (&req, &url);
        self.with_retry(|attempt| self.execute_single_request(req, url, attempt))
            .await
    }

    /// Execute `req` and decode the body as `T`.
    ///
    /// Decoding happens inside the retry loop, so a malformed body is
    /// retried like any other transient failure.
    ///
    /// # Errors
    ///
    /// As for [`Client::execute`], plus [`PagerDutyError::Schema`] when the
    /// body is well-formed JSON of the wrong shape.
    pub async fn request<T: DeserializeOwned>(&self, req: ApiRequest) -> Result<T, PagerDutyError> {
        self.request_with_status(req).await.map(|(_, value)| value)
    }

    /// As [`Client::request`], also returning the status of the response
    /// the value was decoded from.
    ///
    /// # Errors
    ///
    /// As for [`Client::request`].
    pub async fn request_with_status<T: DeserializeOwned>(
        &self,
        req: ApiRequest,
    ) -> Result<(u16, T), PagerDutyError> {
        let url = req.url(&self.base_url)?;
        let (req, url) = (&req, &url);
        self.with_retry(|attempt| async move {
            let resp = self.execute_single_request(req, url, attempt).await?;
            resp.json::<T>().map(|value| (resp.status, value))
        })
        .await
    }

    /// Execute `req` unless `cancel` completes first.
    ///
    /// When `cancel` wins, the in-flight attempt is dropped and no further
    /// retries are made.
    ///
    /// # Errors
    ///
    /// Returns [`PagerDutyError::Cancelled`] on cancellation, otherwise as
    /// for [`Client::execute`].
    pub async fn execute_cancellable<C>(
        &self,
        req: ApiRequest,
        cancel: C,
    ) -> Result<HttpResponse, PagerDutyError>
    where
        C: Future<Output = ()>,
    {
        tokio::select! {
            res = self.execute(req) => res,
            () = cancel => Err(PagerDutyError::Cancelled("cancelled by caller".boxed())),
        }
    }

    /// `GET path` with `query`, decoding the body.
    ///
    /// # Errors
    ///
    /// As for [`Client::request`].
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, PagerDutyError> {
        self.request(ApiRequest::get(path).query_pairs(query)).await
    }

    /// `POST path` with a JSON body, decoding the response.
    ///
    /// # Errors
    ///
    /// As for [`Client::request`], plus [`PagerDutyError::InvalidRequest`]
    /// when `body` cannot be serialised.
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, PagerDutyError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(ApiRequest::post(path).json(body)?).await
    }

    /// `PUT path` with a JSON body, decoding the response.
    ///
    /// # Errors
    ///
    /// As for [`Client::post`].
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, PagerDutyError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(ApiRequest::put(path).json(body)?).await
    }

    /// `DELETE path`, discarding the body.
    ///
    /// # Errors
    ///
    /// As for [`Client::execute`].
    pub async fn delete(&self, path: &str) -> Result<(), PagerDutyError> {
        self.execute(ApiRequest::delete(path)).await.map(|_| ())
    }

    /// Abilities granted to the account behind the token.
    ///
    /// # Errors
    ///
    /// As for [`Client::request`].
    pub async fn abilities(&self) -> Result<Vec<String>, PagerDutyError> {
        let envelope: AbilitiesEnvelope = self.request(ApiRequest::get("/abilities")).await?;
        Ok(envelope.abilities)
    }

    /// Check that the token is accepted by the API.
    ///
    /// # Errors
    ///
    /// Returns the underlying error, typically a 401 [`PagerDutyError::Http`]
    /// for a rejected token.
    pub async fn validate_auth(&self) -> Result<(), PagerDutyError> {
        self.abilities().await.map(|_| ())
    }

    /// Whether the account has ability `name`.
    ///
    /// # Errors
    ///
    /// Returns any error other than the 402 the API uses for a missing
    /// ability.
    pub async fn has_ability(&self, name: &str) -> Result<bool, PagerDutyError> {
        match self.execute(ApiRequest::get(format!("/abilities/{name}"))).await {
            Ok(_) => Ok(true),
            Err(err) if err.status() == Some(402) => Ok(false),
            Err(err) => Err(err),
        }
    }
}
