//! The cached form of an HTTP response.

use std::collections::BTreeMap;

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Response, StatusCode};
use http_body_util::Full;
use serde::{Deserialize, Serialize};

use crate::error::CacheError;

/// A response captured by the cache layer.
///
/// Entries hold the body as text, a flattened header map (one value per
/// header name), and the numeric status. The layer only ever writes entries
/// for `200 OK` responses, but a decoded entry may carry any valid status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub body: String,
    pub headers: BTreeMap<String, String>,
    pub status: u16,
}

impl CacheEntry {
    pub fn new(
        status: StatusCode,
        headers: BTreeMap<String, String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            body: body.into(),
            headers,
            status: status.as_u16(),
        }
    }

    /// Captures a response's status, headers and collected body.
    ///
    /// Returns `None` when the body is not valid UTF-8, since it cannot be
    /// stored as text without altering it.
    pub fn capture(status: StatusCode, headers: &HeaderMap, body: &Bytes) -> Option<Self> {
        let body = std::str::from_utf8(body).ok()?;
        Some(Self::new(status, flatten_headers(headers), body))
    }

    /// Returns the stored status as a [`StatusCode`].
    pub fn status_code(&self) -> Result<StatusCode, CacheError> {
        StatusCode::from_u16(self.status)
            .map_err(|_| CacheError::Malformed(format!("invalid status code {}", self.status)))
    }

    /// Rebuilds an `http::Response` from the entry.
    ///
    /// Header pairs that are no longer valid header names or values are
    /// dropped.
    pub fn into_response(self) -> Result<Response<Full<Bytes>>, CacheError> {
        let status = self.status_code()?;
        let mut response = Response::new(Full::from(self.body));
        *response.status_mut() = status;

        let headers = response.headers_mut();
        for (name, value) in self.headers {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(&value),
            ) {
                headers.insert(name, value);
            }
        }

        Ok(response)
    }
}

/// Flattens a header map into one value per name.
///
/// Headers are visited in map order, so when a name carries several values
/// the last one wins. Values that are not visible ASCII are skipped.
pub fn flatten_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut flat = BTreeMap::new();
    for (name, value) in headers {
        match value.to_str() {
            Ok(value) => {
                flat.insert(name.as_str().to_owned(), value.to_owned());
            }
            Err(_) => {
                tracing::debug!(header = %name, "skipping non-text header value");
            }
        }
    }
    flat
}
