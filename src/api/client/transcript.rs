//! Transcript logging for REST requests.

use std::io::Write as _;

use log::warn;
use serde_json::json;
use url::Url;

use super::Client;
use super::HttpResponse;
use super::helpers::{body_snippet, payload_snippet};
use crate::api::ApiRequest;

impl Client {
    /// Append one attempt to the transcript if enabled.
    pub(super) fn log_transcript(
        &self,
        req: &ApiRequest,
        url: &Url,
        attempt: usize,
        resp: &HttpResponse,
    ) {
        let Some(t) = &self.transcript else {
            return;
        };
        let method = req.method().as_str();
        let line = json!({
            "method": method,
            "url": url.as_str(),
            "attempt": attempt,
            "status": resp.status,
            "request": req.body_json().map(payload_snippet),
            "response": body_snippet(&resp.body),
        });
        match t.lock() {
            Ok(mut f) => {
                if let Err(e) = writeln!(f, "{line}") {
                    warn!("failed to write transcript for {method} {url}: {e}");
                    return;
                }
                if let Err(e) = f.flush() {
                    warn!("failed to flush transcript for {method} {url}: {e}");
                }
            }
            Err(e) => {
                warn!("failed to lock transcript for {method} {url}: {e}");
            }
        }
    }
}
