use http::{HeaderValue, StatusCode};
use std::time::Duration;

use crate::error::CacheError;

/// Largest accepted TTL. Redis rejects expirations whose millisecond value
/// overflows an `i64`.
pub const MAX_TTL_SECS: u64 = i64::MAX as u64 / 1_000;

/// Runtime cache policy shared by every service a layer produces.
///
/// The policy fixes the entry lifetime and decides which responses are
/// stored. Only `200 OK` responses are cacheable.
#[derive(Clone, Debug)]
pub struct CachePolicy {
    ttl_secs: u64,
    cache_control: HeaderValue,
}

impl CachePolicy {
    /// Builds a policy with a time-to-live of `ttl_secs` seconds.
    ///
    /// Fails with [`CacheError::InvalidTtl`] when `ttl_secs` is zero or
    /// above [`MAX_TTL_SECS`].
    pub fn new(ttl_secs: u64) -> Result<Self, CacheError> {
        if ttl_secs == 0 || ttl_secs > MAX_TTL_SECS {
            return Err(CacheError::InvalidTtl);
        }
        let cache_control = HeaderValue::from_str(&format!("public, max-age={ttl_secs}"))
            .map_err(|_| CacheError::InvalidTtl)?;
        Ok(Self {
            ttl_secs,
            cache_control,
        })
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Returns whether a response with `status` may be stored.
    pub fn is_cacheable(&self, status: StatusCode) -> bool {
        status == StatusCode::OK
    }

    /// The `Cache-Control` value set on freshly stored responses.
    pub fn cache_control(&self) -> HeaderValue {
        self.cache_control.clone()
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            ttl_secs: 60,
            cache_control: HeaderValue::from_static("public, max-age=60"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_ttl_is_rejected() {
        assert!(matches!(CachePolicy::new(0), Err(CacheError::InvalidTtl)));
    }

    #[test]
    fn ttl_above_bound_is_rejected() {
        assert!(matches!(
            CachePolicy::new(MAX_TTL_SECS + 1),
            Err(CacheError::InvalidTtl)
        ));
        assert!(matches!(CachePolicy::new(u64::MAX), Err(CacheError::InvalidTtl)));

        let policy = CachePolicy::new(MAX_TTL_SECS).unwrap();
        assert_eq!(policy.ttl_secs(), MAX_TTL_SECS);
    }

    #[test]
    fn cache_control_carries_ttl() {
        let policy = CachePolicy::new(300).unwrap();
        assert_eq!(policy.cache_control(), "public, max-age=300");
        assert_eq!(policy.ttl(), Duration::from_secs(300));
    }

    #[test]
    fn default_matches_explicit_sixty_seconds() {
        let default = CachePolicy::default();
        let explicit = CachePolicy::new(60).unwrap();
        assert_eq!(default.ttl_secs(), explicit.ttl_secs());
        assert_eq!(default.cache_control(), explicit.cache_control());
    }

    #[test]
    fn only_ok_is_cacheable() {
        let policy = CachePolicy::default();
        assert!(policy.is_cacheable(StatusCode::OK));
        for status in [
            StatusCode::CREATED,
            StatusCode::NO_CONTENT,
            StatusCode::NOT_MODIFIED,
            StatusCode::NOT_FOUND,
            StatusCode::INTERNAL_SERVER_ERROR,
        ] {
            assert!(!policy.is_cacheable(status), "{status} must not be cached");
        }
    }
}
