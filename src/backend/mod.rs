//! Key-value stores for the cache layer.
//!
//! The cache layer reads and writes opaque byte values through a
//! [`CacheBackend`]. Interpreting those bytes is the job of a
//! [`CacheCodec`](crate::codec::CacheCodec). This module ships with:
//! - [`memory::InMemoryBackend`] — a process-local store backed by [`moka`].
//! - `redis::RedisBackend` *(optional)* — a shared store when the
//!   `redis-backend` crate feature is enabled.
//!
//! Backends own expiration: every value is written with a time-to-live and
//! must stop being returned once it elapses.

pub mod memory;
#[cfg(feature = "redis-backend")]
pub mod redis;

use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;

use crate::error::CacheError;

#[async_trait]
pub trait CacheBackend: Send + Sync + Clone + 'static {
    /// Fetches the raw value stored under `key`.
    ///
    /// Returns `Ok(None)` when the backend does not have a value or the
    /// value has expired.
    async fn get(&self, key: &str) -> Result<Option<Bytes>, CacheError>;

    /// Stores `value` under `key` for `ttl`, replacing any previous value.
    async fn set(&self, key: String, value: Bytes, ttl: Duration) -> Result<(), CacheError>;
}
