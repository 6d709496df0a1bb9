//! Request identifiers used to correlate cache events.

use http::Request;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Identifier attached to every structured cache event of a request.
///
/// Taken from the inbound `X-Request-ID` header when present, otherwise a
/// fresh UUID v4.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct RequestId(String);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_request<B>(req: &Request<B>) -> Self {
        req.headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .map(|value| Self(value.to_owned()))
            .unwrap_or_default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for RequestId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_owned()))
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique_uuids() {
        let a = RequestId::new();
        let b = RequestId::new();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(a.as_str()).is_ok());
    }

    #[test]
    fn header_value_is_reused() {
        let req = Request::builder()
            .header(REQUEST_ID_HEADER, "req-42")
            .body(())
            .unwrap();
        assert_eq!(RequestId::from_request(&req).as_str(), "req-42");
    }

    #[test]
    fn empty_header_generates_new_id() {
        let req = Request::builder()
            .header(REQUEST_ID_HEADER, "")
            .body(())
            .unwrap();
        let id = RequestId::from_request(&req);
        assert!(Uuid::parse_str(id.as_str()).is_ok());
    }

    #[test]
    fn parses_and_displays() {
        let id: RequestId = "abc".parse().unwrap();
        assert_eq!(id.to_string(), "abc");
    }
}
