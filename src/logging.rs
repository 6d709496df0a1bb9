//! Structured cache events.
//!
//! Besides the plain `tracing` diagnostics emitted by the layer, each cache
//! operation of a request (lookup outcome, store outcome) can be reported as
//! a JSON event.
//! Events are emitted through `tracing::info!` on the
//! `tower_http_cacher::events` target so they can be routed separately
//! from regular logs.

use crate::request_id::RequestId;
use chrono::{DateTime, SecondsFormat, Utc};
use http::StatusCode;
use serde::Serialize;
use serde_json::json;
use sha2::{Digest, Sha256};
use std::time::{Duration, SystemTime};

/// Configuration for structured cache events.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Emit structured events.
    pub enabled: bool,

    /// Replace cache keys (full URLs) by their SHA-256 digest, both in
    /// structured events and in the layer's `tracing` diagnostics.
    pub hash_keys: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            hash_keys: true,
        }
    }
}

impl LoggingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_hash_keys(mut self, hash: bool) -> Self {
        self.hash_keys = hash;
        self
    }

    /// Returns `key` as it may appear in logs.
    pub fn display_key(&self, key: &str) -> String {
        if self.hash_keys {
            hash_key(key)
        } else {
            key.to_owned()
        }
    }
}

/// Outcome recorded by a [`CacheEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheEventType {
    /// Served from a stored entry.
    Hit,
    /// Nothing stored; the inner service was called.
    Miss,
    /// A fresh response was written to the backend.
    Store,
    /// Writing a fresh response failed; the response was still returned.
    StoreError,
    /// The response was not eligible for caching.
    Uncacheable,
    /// The stored value could not be decoded and was treated as a miss.
    Malformed,
    /// The backend lookup failed and was treated as a miss.
    LookupError,
}

impl CacheEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheEventType::Hit => "hit",
            CacheEventType::Miss => "miss",
            CacheEventType::Store => "store",
            CacheEventType::StoreError => "store_error",
            CacheEventType::Uncacheable => "uncacheable",
            CacheEventType::Malformed => "malformed",
            CacheEventType::LookupError => "lookup_error",
        }
    }
}

/// A single structured cache event.
#[derive(Debug, Clone)]
pub struct CacheEvent {
    pub timestamp: SystemTime,
    pub event_type: CacheEventType,
    pub request_id: RequestId,
    pub key: String,
    pub status: Option<StatusCode>,
    pub latency_us: Option<u64>,
    pub size_bytes: Option<usize>,
    pub ttl_seconds: Option<u64>,
}

impl CacheEvent {
    pub fn new(event_type: CacheEventType, request_id: RequestId, key: impl Into<String>) -> Self {
        Self {
            timestamp: SystemTime::now(),
            event_type,
            request_id,
            key: key.into(),
            status: None,
            latency_us: None,
            size_bytes: None,
            ttl_seconds: None,
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency_us = Some(u64::try_from(latency.as_micros()).unwrap_or(u64::MAX));
        self
    }

    pub fn with_size(mut self, size: usize) -> Self {
        self.size_bytes = Some(size);
        self
    }

    pub fn with_ttl_secs(mut self, ttl: u64) -> Self {
        self.ttl_seconds = Some(ttl);
        self
    }

    /// Renders the event as a JSON object.
    pub fn to_json(&self, config: &LoggingConfig) -> serde_json::Value {
        let key = config.display_key(&self.key);

        json!({
            "timestamp": DateTime::<Utc>::from(self.timestamp)
                .to_rfc3339_opts(SecondsFormat::Millis, true),
            "event": self.event_type.as_str(),
            "request_id": self.request_id.as_str(),
            "key": key,
            "status": self.status.map(|s| s.as_u16()),
            "latency_us": self.latency_us,
            "size_bytes": self.size_bytes,
            "ttl_seconds": self.ttl_seconds,
        })
    }

    /// Emits the event if structured events are enabled.
    pub fn log(&self, config: &LoggingConfig) {
        if !config.enabled {
            return;
        }
        let data = self.to_json(config);
        tracing::info!(target: "tower_http_cacher::events", event = %data);
    }
}

/// Hashes a cache key using SHA-256.
pub fn hash_key(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}
