use async_trait::async_trait;
use bytes::Bytes;
use moka::future::Cache;
use std::time::{Duration, Instant};

use super::CacheBackend;
use crate::error::CacheError;

/// An in-memory [`CacheBackend`] implementation backed by [`moka`].
///
/// The backend is cheap to clone and shares a single underlying cache.
#[derive(Clone)]
pub struct InMemoryBackend {
    cache: Cache<String, StoredValue>,
}

#[derive(Clone)]
struct StoredValue {
    value: Bytes,
    expires_at: Instant,
}

impl InMemoryBackend {
    /// Creates a new in-memory cache with the provided `max_capacity`.
    ///
    /// The capacity is expressed in number of cached entries, not bytes.
    pub fn new(max_capacity: u64) -> Self {
        let cache = Cache::builder().max_capacity(max_capacity).build();
        Self { cache }
    }
}

#[async_trait]
impl CacheBackend for InMemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, CacheError> {
        match self.cache.get(key).await {
            Some(stored) if Instant::now() < stored.expires_at => Ok(Some(stored.value)),
            Some(_) => {
                self.cache.invalidate(key).await;
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: String, value: Bytes, ttl: Duration) -> Result<(), CacheError> {
        if ttl.is_zero() {
            return Ok(());
        }

        let expires_at = Instant::now()
            .checked_add(ttl)
            .ok_or_else(|| CacheError::Backend(format!("ttl {ttl:?} out of range")))?;
        let stored = StoredValue { value, expires_at };
        self.cache.insert(key, stored).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    #[tokio::test]
    async fn set_and_get_returns_stored_value() {
        let backend = InMemoryBackend::new(16);

        backend
            .set("key".into(), Bytes::from_static(b"alpha"), Duration::from_secs(1))
            .await
            .expect("set succeeds");

        let read = backend.get("key").await.expect("get succeeds");
        assert_eq!(read, Some(Bytes::from_static(b"alpha")));
    }

    #[tokio::test]
    async fn later_write_replaces_earlier_one() {
        let backend = InMemoryBackend::new(16);
        let ttl = Duration::from_secs(5);

        backend.set("key".into(), Bytes::from_static(b"first"), ttl).await.unwrap();
        backend.set("key".into(), Bytes::from_static(b"second"), ttl).await.unwrap();

        let read = backend.get("key").await.unwrap();
        assert_eq!(read, Some(Bytes::from_static(b"second")));
    }

    #[tokio::test]
    async fn value_expires_after_ttl() {
        let backend = InMemoryBackend::new(16);

        backend
            .set("key".into(), Bytes::from_static(b"short"), Duration::from_millis(30))
            .await
            .expect("set succeeds");
        assert!(backend.get("key").await.unwrap().is_some());

        sleep(Duration::from_millis(60)).await;
        assert!(backend.get("key").await.unwrap().is_none(), "value removed after ttl");
    }

    #[tokio::test]
    async fn unrepresentable_ttl_is_an_error() {
        let backend = InMemoryBackend::new(16);

        let err = backend
            .set("key".into(), Bytes::from_static(b"x"), Duration::MAX)
            .await
            .unwrap_err();

        assert!(matches!(err, CacheError::Backend(_)));
        assert!(backend.get("key").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn zero_ttl_is_not_stored() {
        let backend = InMemoryBackend::new(16);

        backend
            .set("key".into(), Bytes::from_static(b"x"), Duration::ZERO)
            .await
            .unwrap();

        assert!(backend.get("key").await.unwrap().is_none());
    }
}
