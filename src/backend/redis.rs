use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use super::CacheBackend;
use crate::error::CacheError;

/// A [`CacheBackend`] storing values in Redis with `SET key value EX ttl`.
///
/// Keys are the cache keys as given, or `namespace:key` when a namespace is
/// configured. Expiry is left entirely to Redis.
///
/// The connection manager is multiplexed; each call works on its own clone.
#[derive(Clone)]
pub struct RedisBackend {
    connection: ConnectionManager,
    namespace: Option<String>,
}

impl RedisBackend {
    pub fn new(connection: ConnectionManager) -> Self {
        Self {
            connection,
            namespace: None,
        }
    }

    /// Opens a managed connection to the Redis server at `url`.
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(url)?;
        let manager = client.get_connection_manager().await?;
        Ok(Self::new(manager))
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    fn make_key(&self, key: &str) -> String {
        match &self.namespace {
            Some(namespace) => format!("{namespace}:{key}"),
            None => key.to_owned(),
        }
    }
}

#[async_trait]
impl CacheBackend for RedisBackend {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, CacheError> {
        let mut conn = self.connection.clone();
        let data: Option<Vec<u8>> = conn.get(self.make_key(key)).await?;
        Ok(data.map(Bytes::from))
    }

    async fn set(&self, key: String, value: Bytes, ttl: Duration) -> Result<(), CacheError> {
        if ttl.is_zero() {
            return Ok(());
        }

        let ttl_secs = ttl.as_secs().max(1);
        let mut conn = self.connection.clone();
        let _: () = conn
            .set_ex(self.make_key(&key), &value[..], ttl_secs)
            .await?;
        Ok(())
    }
}
