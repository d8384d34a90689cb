//! Helper utilities for request handling.

use log::warn;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;

use super::types::{ACCEPT_V2, ErrorEnvelope, Token};
use crate::error::{ApiError, BoxedStr, PagerDutyError};

/// Maximum number of characters kept from response bodies in errors and
/// transcripts.
pub(super) const BODY_SNIPPET_LEN: usize = 500;
/// Maximum number of characters kept from request payloads.
pub(super) const REQUEST_SNIPPET_LEN: usize = 1024;

/// Trim `text` to `max` characters, appending `...` when truncated.
///
/// Returns an empty string when `max` is zero.
pub(super) fn snippet(text: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut out = text.chars().take(max).collect::<String>();
        out.push_str("...");
        out
    }
}

/// Lossy UTF-8 snippet of a response body.
pub(super) fn body_snippet(body: &[u8]) -> String {
    snippet(&String::from_utf8_lossy(body), BODY_SNIPPET_LEN)
}

fn redact_sensitive(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (k, v) in map.iter_mut() {
                if matches!(
                    k.to_ascii_lowercase().as_str(),
                    "token"
                        | "authorization"
                        | "password"
                        | "secret"
                        | "access_token"
                        | "refresh_token"
                        | "api_key"
                        | "routing_key"
                        | "integration_key"
                        | "private_key"
                ) {
                    *v = Value::String("<redacted>".into());
                } else {
                    redact_sensitive(v);
                }
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(redact_sensitive),
        _ => {}
    }
}

/// Redacted copy of a request payload, for transcripts.
fn redacted(payload: &Value) -> Value {
    let mut copy = payload.clone();
    redact_sensitive(&mut copy);
    copy
}

/// Build a snippet of the redacted request payload.
///
/// Falls back to a placeholder when serialisation fails, logging the error.
pub(super) fn payload_snippet(payload: &Value) -> String {
    let json = match serde_json::to_string(&redacted(payload)) {
        Ok(s) => s,
        Err(e) => {
            warn!("Failed to serialise redacted payload: {e}");
            "<failed to serialise payload>".into()
        }
    };
    snippet(&json, REQUEST_SNIPPET_LEN)
}

/// Decode the documented `{"error": {...}}` body, if present.
pub(super) fn decode_api_error(body: &[u8]) -> Option<ApiError> {
    serde_json::from_slice::<ErrorEnvelope>(body)
        .ok()
        .map(|envelope| envelope.error)
}

/// Build the headers sent with every request.
pub(super) fn build_headers(token: &Token, user_agent: &str) -> Result<HeaderMap, PagerDutyError> {
    if token.is_empty() {
        return Err(PagerDutyError::InvalidRequest(
            "an empty token was provided".boxed(),
        ));
    }
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_V2));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    let agent = HeaderValue::from_str(user_agent).map_err(|e| {
        PagerDutyError::InvalidRequest(format!("parse User-Agent header: {e}").boxed())
    })?;
    headers.insert(USER_AGENT, agent);
    let mut auth = HeaderValue::from_str(&format!("Token token={}", token.as_str())).map_err(
        |e| PagerDutyError::InvalidRequest(format!("parse Authorization header: {e}").boxed()),
    )?;
    auth.set_sensitive(true);
    headers.insert(AUTHORIZATION, auth);
    Ok(headers)
}
