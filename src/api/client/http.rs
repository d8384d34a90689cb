//! HTTP response wrapper used by the REST client.

use bytes::Bytes;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde_json::error::Category;

use super::helpers::body_snippet;
use crate::error::{BoxedStr, PagerDutyError};

/// Status, headers and raw body of one attempt.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl HttpResponse {
    /// Decode the body as `T`.
    ///
    /// Bodies that are not well-formed JSON produce a retryable
    /// [`PagerDutyError::Decode`]. Well-formed JSON that does not match `T`
    /// produces a fatal [`PagerDutyError::Schema`] naming the offending path.
    ///
    /// # Errors
    ///
    /// Returns [`PagerDutyError::Decode`] or [`PagerDutyError::Schema`] as
    /// described above.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, PagerDutyError> {
        decode_body(self.status, &self.body)
    }
}

pub(super) fn decode_body<T: DeserializeOwned>(status: u16, body: &[u8]) -> Result<T, PagerDutyError> {
    let mut de = serde_json::Deserializer::from_slice(body);
    let value = serde_path_to_error::deserialize(&mut de).map_err(|e| {
        let path = e.path().to_string();
        let inner = e.into_inner();
        let message = if path == "." {
            inner.to_string()
        } else {
            format!("{inner} at {path}")
        };
        classified(status, message, inner.classify(), body)
    })?;
    de.end()
        .map_err(|e| classified(status, e.to_string(), e.classify(), body))?;
    Ok(value)
}

fn classified(status: u16, message: String, category: Category, body: &[u8]) -> PagerDutyError {
    let message = message.boxed();
    let snippet = body_snippet(body).boxed();
    match category {
        Category::Data => PagerDutyError::Schema {
            status,
            message,
            snippet,
        },
        Category::Syntax | Category::Eof | Category::Io => PagerDutyError::Decode {
            status,
            message,
            snippet,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::decode_body;
    use crate::error::{ErrorKind, PagerDutyError};
    use rstest::rstest;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct User {
        #[serde(rename = "id")]
        _id: String,
        #[serde(rename = "age")]
        _age: u32,
    }

    #[rstest]
    #[case(b"{\"id\": \"P1\", \"age\"".as_slice(), ErrorKind::Decode)]
    #[case(b"<html>bad gateway</html>".as_slice(), ErrorKind::Decode)]
    #[case(b"".as_slice(), ErrorKind::Decode)]
    #[case(b"{\"id\": \"P1\", \"age\": 1} trailing".as_slice(), ErrorKind::Decode)]
    #[case(b"{\"id\": \"P1\", \"age\": \"old\"}".as_slice(), ErrorKind::Schema)]
    #[case(b"{\"id\": \"P1\"}".as_slice(), ErrorKind::Schema)]
    fn decode_failures_are_classified(#[case] body: &[u8], #[case] kind: ErrorKind) {
        let err = decode_body::<User>(200, body).expect_err("decode should fail");
        assert_eq!(err.kind(), kind, "{err}");
    }

    #[test]
    fn schema_error_names_path() {
        let err = decode_body::<User>(200, br#"{"id": "P1", "age": "old"}"#)
            .expect_err("wrong type");
        let PagerDutyError::Schema { message, .. } = err else {
            panic!("expected schema error, got {err:?}");
        };
        assert!(message.contains("age"), "{message}");
    }
}
