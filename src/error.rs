use thiserror::Error;

/// Errors raised by the cache layer, its codecs, and its backends.
///
/// None of these reach the caller of a wrapped service: lookup and store
/// failures degrade to a cache miss.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("backend error: {0}")]
    Backend(String),

    /// The stored value does not have the shape of a cache entry.
    #[error("malformed cache entry: {0}")]
    Malformed(String),

    #[error("cache ttl must be between one second and {} seconds", crate::policy::MAX_TTL_SECS)]
    InvalidTtl,

    #[cfg(feature = "redis-backend")]
    #[error(transparent)]
    Redis(#[from] redis::RedisError),
}

impl CacheError {
    /// Returns `true` when the error came from decoding a stored value
    /// rather than from talking to the backend.
    pub fn is_malformed(&self) -> bool {
        matches!(self, CacheError::Malformed(_))
    }
}
