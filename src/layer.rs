use std::error::Error as StdError;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use bytes::Bytes;
use futures_util::future::BoxFuture;
use http::header::{HeaderName, CACHE_CONTROL};
use http::{HeaderValue, Request, Response};
use http_body::Body;
use http_body_util::{BodyExt, Either, Full};
use tower::{Layer, Service, ServiceExt};

#[cfg(feature = "metrics")]
use metrics::{counter, histogram};

use crate::backend::CacheBackend;
use crate::codec::{CacheCodec, JsonCodec};
use crate::entry::CacheEntry;
use crate::error::CacheError;
use crate::key::cache_key;
use crate::logging::{CacheEvent, CacheEventType, LoggingConfig};
use crate::policy::CachePolicy;
use crate::request_id::RequestId;

pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Response body produced by [`CacheService`].
///
/// `Left` carries buffered bodies (cache hits and freshly stored misses),
/// `Right` the untouched body of responses that were not cacheable.
pub type CacheBody<B> = Either<Full<Bytes>, B>;

/// Header reporting whether a response came from the cache.
pub const CACHE_STATUS_HEADER: HeaderName = HeaderName::from_static("x-redis-cache");

const HIT: HeaderValue = HeaderValue::from_static("HIT");
const MISS: HeaderValue = HeaderValue::from_static("MISS");

/// Cache-aside layer for Tower services.
///
/// Responses are keyed on the full request URL. A stored entry is served
/// directly; otherwise the inner service runs and its `200 OK` responses are
/// stored for the configured TTL. Failures of the cache itself never fail
/// the request: they are logged and handled as a miss.
///
/// Cloning a `CacheLayer` is cheap and shares the underlying backend.
#[derive(Clone)]
pub struct CacheLayer<B, C = JsonCodec> {
    backend: B,
    codec: C,
    policy: CachePolicy,
    logging: LoggingConfig,
}

/// Builder for configuring [`CacheLayer`] instances.
pub struct CacheLayerBuilder<B, C = JsonCodec> {
    backend: B,
    codec: C,
    ttl_secs: u64,
    logging: LoggingConfig,
}

impl<B> CacheLayerBuilder<B, JsonCodec>
where
    B: CacheBackend,
{
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            codec: JsonCodec,
            ttl_secs: CachePolicy::default().ttl_secs(),
            logging: LoggingConfig::default(),
        }
    }
}

impl<B, C> CacheLayerBuilder<B, C>
where
    B: CacheBackend,
    C: CacheCodec,
{
    /// Sets the entry lifetime in seconds.
    pub fn ttl_secs(mut self, secs: u64) -> Self {
        self.ttl_secs = secs;
        self
    }

    /// Sets the entry lifetime. Sub-second precision is discarded.
    pub fn ttl(self, ttl: Duration) -> Self {
        self.ttl_secs(ttl.as_secs())
    }

    pub fn logging(mut self, config: LoggingConfig) -> Self {
        self.logging = config;
        self
    }

    /// Replaces the codec used to store and read entries.
    pub fn codec<NC>(self, codec: NC) -> CacheLayerBuilder<B, NC>
    where
        NC: CacheCodec,
    {
        CacheLayerBuilder {
            backend: self.backend,
            codec,
            ttl_secs: self.ttl_secs,
            logging: self.logging,
        }
    }

    /// Builds the layer, failing when the TTL is zero.
    pub fn build(self) -> Result<CacheLayer<B, C>, CacheError> {
        Ok(CacheLayer {
            backend: self.backend,
            codec: self.codec,
            policy: CachePolicy::new(self.ttl_secs)?,
            logging: self.logging,
        })
    }
}

impl<B> CacheLayer<B, JsonCodec>
where
    B: CacheBackend,
{
    /// Builds a layer storing entries for `ttl_secs` seconds.
    pub fn new(backend: B, ttl_secs: u64) -> Result<Self, CacheError> {
        CacheLayerBuilder::new(backend).ttl_secs(ttl_secs).build()
    }

    pub fn builder(backend: B) -> CacheLayerBuilder<B> {
        CacheLayerBuilder::new(backend)
    }
}

impl<B, C> CacheLayer<B, C> {
    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<S, B, C> Layer<S> for CacheLayer<B, C>
where
    B: CacheBackend,
    C: CacheCodec,
{
    type Service = CacheService<S, B, C>;

    fn layer(&self, inner: S) -> Self::Service {
        CacheService {
            inner,
            backend: self.backend.clone(),
            codec: self.codec.clone(),
            policy: self.policy.clone(),
            logging: self.logging.clone(),
        }
    }
}

#[derive(Clone)]
pub struct CacheService<S, B, C = JsonCodec> {
    inner: S,
    backend: B,
    codec: C,
    policy: CachePolicy,
    logging: LoggingConfig,
}

impl<S, B, C, ReqBody, ResBody> Service<Request<ReqBody>> for CacheService<S, B, C>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Into<BoxError> + Send,
    ReqBody: Send + 'static,
    ResBody: Body<Data = Bytes> + Send + 'static,
    ResBody::Error: Into<BoxError> + Send,
    B: CacheBackend,
    C: CacheCodec,
{
    type Response = Response<CacheBody<ResBody>>;
    type Error = BoxError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(Into::into)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let interceptor = Interceptor {
            backend: self.backend.clone(),
            codec: self.codec.clone(),
            policy: self.policy.clone(),
            logging: self.logging.clone(),
        };
        let next = self.inner.clone();

        Box::pin(interceptor.intercept(req, next))
    }
}

/// Per-request state of the cache-aside flow.
struct Interceptor<B, C> {
    backend: B,
    codec: C,
    policy: CachePolicy,
    logging: LoggingConfig,
}

impl<B, C> Interceptor<B, C>
where
    B: CacheBackend,
    C: CacheCodec,
{
    async fn intercept<S, ReqBody, ResBody>(
        self,
        req: Request<ReqBody>,
        next: S,
    ) -> Result<Response<CacheBody<ResBody>>, BoxError>
    where
        S: Service<Request<ReqBody>, Response = Response<ResBody>>,
        S::Error: Into<BoxError>,
        ResBody: Body<Data = Bytes>,
        ResBody::Error: Into<BoxError>,
    {
        let started = Instant::now();
        let key = cache_key(&req);
        let request_id = RequestId::from_request(&req);
        let log_key = self.logging.display_key(&key);

        match self.lookup(&key).await {
            Ok(Some(mut response)) => {
                #[cfg(feature = "metrics")]
                counter!("tower_http_cacher.hit").increment(1);
                tracing::debug!(key = %log_key, "cache hit");

                response.headers_mut().insert(CACHE_STATUS_HEADER, HIT);
                CacheEvent::new(CacheEventType::Hit, request_id, key)
                    .with_status(response.status())
                    .with_latency(started.elapsed())
                    .log(&self.logging);
                return Ok(response.map(Either::Left));
            }
            Ok(None) => {
                tracing::debug!(key = %log_key, "cache miss");
                CacheEvent::new(CacheEventType::Miss, request_id.clone(), key.clone())
                    .log(&self.logging);
            }
            Err(err) => {
                #[cfg(feature = "metrics")]
                counter!("tower_http_cacher.lookup_error").increment(1);
                tracing::warn!(key = %log_key, error = %err, "cache lookup failed, treating as miss");

                let event_type = if err.is_malformed() {
                    CacheEventType::Malformed
                } else {
                    CacheEventType::LookupError
                };
                CacheEvent::new(event_type, request_id.clone(), key.clone()).log(&self.logging);
            }
        }

        #[cfg(feature = "metrics")]
        counter!("tower_http_cacher.miss").increment(1);

        #[cfg(feature = "metrics")]
        let forwarded = Instant::now();
        let response = next.oneshot(req).await.map_err(Into::<BoxError>::into)?;
        #[cfg(feature = "metrics")]
        histogram!("tower_http_cacher.backend_latency").record(forwarded.elapsed().as_secs_f64());

        let status = response.status();
        if !self.policy.is_cacheable(status) {
            #[cfg(feature = "metrics")]
            counter!("tower_http_cacher.uncacheable").increment(1);
            tracing::debug!(key = %log_key, status = %status, "response not cacheable");

            CacheEvent::new(CacheEventType::Uncacheable, request_id, key)
                .with_status(status)
                .with_latency(started.elapsed())
                .log(&self.logging);
            return Ok(response.map(Either::Right));
        }

        let (mut parts, body) = response.into_parts();
        parts
            .headers
            .insert(CACHE_CONTROL, self.policy.cache_control());

        let body = BodyExt::collect(body)
            .await
            .map_err(Into::<BoxError>::into)?
            .to_bytes();

        match CacheEntry::capture(status, &parts.headers, &body) {
            Some(entry) => {
                let event_type = match self.store(&key, &entry).await {
                    Ok(()) => {
                        #[cfg(feature = "metrics")]
                        counter!("tower_http_cacher.store").increment(1);
                        tracing::debug!(key = %log_key, ttl = self.policy.ttl_secs(), "cached response");
                        CacheEventType::Store
                    }
                    Err(err) => {
                        #[cfg(feature = "metrics")]
                        counter!("tower_http_cacher.store_error").increment(1);
                        tracing::warn!(key = %log_key, error = %err, "failed to store response");
                        CacheEventType::StoreError
                    }
                };
                CacheEvent::new(event_type, request_id, key)
                    .with_status(status)
                    .with_size(body.len())
                    .with_ttl_secs(self.policy.ttl_secs())
                    .with_latency(started.elapsed())
                    .log(&self.logging);
            }
            None => {
                tracing::debug!(key = %log_key, "response body is not utf-8, skipping store");
            }
        }

        parts.headers.insert(CACHE_STATUS_HEADER, MISS);
        Ok(Response::from_parts(parts, Either::Left(Full::new(body))))
    }

    /// Reads and decodes the entry stored under `key`.
    async fn lookup(&self, key: &str) -> Result<Option<Response<Full<Bytes>>>, CacheError> {
        let Some(raw) = self.backend.get(key).await? else {
            return Ok(None);
        };
        let entry = self.codec.decode(&raw)?;
        entry.into_response().map(Some)
    }

    async fn store(&self, key: &str, entry: &CacheEntry) -> Result<(), CacheError> {
        let value = self.codec.encode(entry)?;
        self.backend
            .set(key.to_owned(), value, self.policy.ttl())
            .await
    }
}
