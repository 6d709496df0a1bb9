//! Re-exports for consumers who prefer a single import.
//!
//! ```no_run
//! use tower_http_cacher::prelude::*;
//! # fn build() -> Result<(), CacheError> {
//! let layer = CacheLayer::new(InMemoryBackend::new(128), 60)?;
//! # drop(layer);
//! # Ok(())
//! # }
//! ```

pub use crate::backend::memory::InMemoryBackend;
#[cfg(feature = "redis-backend")]
pub use crate::backend::redis::RedisBackend;
pub use crate::backend::CacheBackend;
pub use crate::codec::{CacheCodec, JsonCodec};
pub use crate::entry::CacheEntry;
pub use crate::error::CacheError;
pub use crate::layer::{CacheBody, CacheLayer, CacheLayerBuilder, CACHE_STATUS_HEADER};
pub use crate::logging::{CacheEvent, CacheEventType, LoggingConfig};
pub use crate::policy::CachePolicy;
