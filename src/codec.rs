use bytes::Bytes;

use crate::entry::CacheEntry;
use crate::error::CacheError;

/// Trait representing a serialization strategy for cached entries.
///
/// `decode` is the schema check for values read back from a backend: any
/// value that is not a well-formed entry must come back as
/// [`CacheError::Malformed`].
pub trait CacheCodec: Send + Sync + Clone + 'static {
    fn encode(&self, entry: &CacheEntry) -> Result<Bytes, CacheError>;
    fn decode(&self, bytes: &[u8]) -> Result<CacheEntry, CacheError>;
}

/// Default [`CacheCodec`] storing entries as JSON objects of the form
/// `{"body": "...", "headers": {"name": "value"}, "status": 200}`.
///
/// Unknown fields are ignored; missing fields, wrongly typed fields and
/// out-of-range status codes are rejected.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonCodec;

impl CacheCodec for JsonCodec {
    fn encode(&self, entry: &CacheEntry) -> Result<Bytes, CacheError> {
        serde_json::to_vec(entry)
            .map(Bytes::from)
            .map_err(|err| CacheError::Backend(err.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<CacheEntry, CacheError> {
        let entry: CacheEntry =
            serde_json::from_slice(bytes).map_err(|err| CacheError::Malformed(err.to_string()))?;
        entry.status_code()?;
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use std::collections::BTreeMap;

    #[test]
    fn encodes_the_three_entry_fields() {
        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_owned(), "text/plain".to_owned());
        let entry = CacheEntry::new(StatusCode::OK, headers, "ok");

        let bytes = JsonCodec.encode(&entry).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(
            value,
            serde_json::json!({
                "body": "ok",
                "headers": {"content-type": "text/plain"},
                "status": 200
            })
        );
    }

    #[test]
    fn decodes_value_written_by_other_clients() {
        let raw = br#"{"status":200,"headers":{"x-a":"1"},"body":"hi","extra":true}"#;

        let entry = JsonCodec.decode(raw).unwrap();

        assert_eq!(entry.body, "hi");
        assert_eq!(entry.status, 200);
        assert_eq!(entry.headers["x-a"], "1");
    }

    #[test]
    fn rejects_missing_field() {
        let err = JsonCodec
            .decode(br#"{"body":"hi","status":200}"#)
            .unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn rejects_wrongly_typed_fields() {
        for raw in [
            &br#"{"body":1,"headers":{},"status":200}"#[..],
            br#"{"body":"x","headers":["a"],"status":200}"#,
            br#"{"body":"x","headers":{"a":1},"status":200}"#,
            br#"{"body":"x","headers":{},"status":"200"}"#,
        ] {
            assert!(JsonCodec.decode(raw).unwrap_err().is_malformed());
        }
    }

    #[test]
    fn rejects_out_of_range_status() {
        let err = JsonCodec
            .decode(br#"{"body":"x","headers":{},"status":1200}"#)
            .unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn rejects_non_json_payload() {
        assert!(JsonCodec.decode(b"not json").unwrap_err().is_malformed());
    }
}
