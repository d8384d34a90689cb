//! Request descriptors.

use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde_json::Value;
use url::Url;

use super::client::BaseUrl;
use crate::error::{BoxedStr, PagerDutyError};

/// A fully described API call.
///
/// The body is kept as a JSON value so each retry re-serialises it.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<Value>,
    headers: HeaderMap,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            headers: HeaderMap::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append a query parameter. Keys may repeat.
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn query_pairs(mut self, pairs: &[(&str, &str)]) -> Self {
        self.query
            .extend(pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())));
        self
    }

    /// Append one `key[]=value` pair per value.
    ///
    /// ```
    /// use pagerduty::api::ApiRequest;
    ///
    /// let req = ApiRequest::get("/customfields/fields").query_list("include", ["field_options"]);
    /// assert_eq!(req.query_string(), "include%5B%5D=field_options");
    /// ```
    #[must_use]
    pub fn query_list<I, V>(mut self, key: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let key = format!("{key}[]");
        self.query
            .extend(values.into_iter().map(|v| (key.clone(), v.into())));
        self
    }

    /// Replace every occurrence of `key` with a single pair.
    #[must_use]
    pub fn set_query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.retain(|(k, _)| k != key);
        self.query.push((key.to_string(), value.into()));
        self
    }

    #[must_use]
    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Serialise `body` as the JSON request body.
    ///
    /// # Errors
    ///
    /// Returns [`PagerDutyError::InvalidRequest`] if `body` cannot be
    /// represented as JSON.
    pub fn json<T: Serialize + ?Sized>(self, body: &T) -> Result<Self, PagerDutyError> {
        let value = serde_json::to_value(body).map_err(|e| {
            PagerDutyError::InvalidRequest(format!("serialising request body: {e}").boxed())
        })?;
        Ok(self.body(value))
    }

    /// Add a header sent with this request only.
    ///
    /// # Errors
    ///
    /// Returns [`PagerDutyError::InvalidRequest`] for an invalid header name
    /// or value.
    pub fn header(mut self, name: &str, value: &str) -> Result<Self, PagerDutyError> {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            PagerDutyError::InvalidRequest(format!("header name {name}: {e}").boxed())
        })?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| PagerDutyError::InvalidRequest(format!("header {name}: {e}").boxed()))?;
        self.headers.append(name, value);
        Ok(self)
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn body_json(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The URL-encoded query string, without a leading `?`.
    #[must_use]
    pub fn query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.query.iter())
            .finish()
    }

    /// Resolve this request against `base`.
    ///
    /// # Errors
    ///
    /// Returns [`PagerDutyError::InvalidRequest`] if the joined URL does not
    /// parse.
    pub fn url(&self, base: &BaseUrl) -> Result<Url, PagerDutyError> {
        let joined = format!(
            "{}/{}",
            base.as_str().trim_end_matches('/'),
            self.path.trim_start_matches('/')
        );
        let mut url = Url::parse(&joined)
            .map_err(|e| PagerDutyError::InvalidRequest(format!("url {joined}: {e}").boxed()))?;
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(self.query.iter());
        }
        Ok(url)
    }
}
