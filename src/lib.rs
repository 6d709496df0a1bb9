//! Tower HTTP Cacher
//! ==================
//!
//! `tower-http-cacher` is a cache-aside response cache for Tower services.
//! Responses are keyed on the full request URL; `200 OK` responses are
//! stored in a key-value backend for a fixed TTL and served from there on
//! later requests.
//!
//! Every response passing through the layer is marked with an
//! `X-Redis-Cache: HIT` or `X-Redis-Cache: MISS` header, and freshly stored
//! responses carry `Cache-Control: public, max-age=<ttl>`. Responses with
//! any other status are returned untouched.
//!
//! ```no_run
//! use tower::{Service, ServiceBuilder, ServiceExt};
//! use tower_http_cacher::prelude::*;
//!
//! # async fn run() -> Result<(), tower_http_cacher::layer::BoxError> {
//! let layer = CacheLayer::builder(InMemoryBackend::new(1_000))
//!     .ttl_secs(30)
//!     .build()?;
//!
//! let mut svc = ServiceBuilder::new()
//!     .layer(layer)
//!     .service(tower::service_fn(|_req| async {
//!         Ok::<_, std::convert::Infallible>(http::Response::new(http_body_util::Full::from("ok")))
//!     }));
//!
//! let response = svc
//!     .ready()
//!     .await?
//!     .call(http::Request::new(()))
//!     .await?;
//! assert_eq!(response.headers()["x-redis-cache"], "MISS");
//! # Ok(())
//! # }
//! ```
//!
//! Cache failures never fail a request: unreachable backends and malformed
//! stored values are logged through `tracing` and handled as a miss.

pub mod backend;
pub mod codec;
pub mod entry;
pub mod error;
pub mod key;
pub mod layer;
pub mod logging;
pub mod policy;
pub mod prelude;
pub mod request_id;

pub use entry::CacheEntry;
pub use error::CacheError;
pub use layer::{CacheLayer, CacheLayerBuilder, CacheService, CACHE_STATUS_HEADER};
pub use logging::{CacheEvent, CacheEventType, LoggingConfig};
pub use request_id::RequestId;
