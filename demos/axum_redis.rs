//! Run with:
//! REDIS_URL=redis://127.0.0.1:6379/ cargo run --example axum_redis

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::error_handling::HandleErrorLayer;
use axum::http::StatusCode;
use axum::{routing::get, Router};
use tower::ServiceBuilder;
use tower_http_cacher::layer::BoxError;
use tower_http_cacher::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http_cacher=debug")),
        )
        .init();

    let redis_url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379/".into());
    let backend = RedisBackend::connect(&redis_url).await?;

    let cache_layer = CacheLayer::builder(backend)
        .ttl_secs(10)
        .logging(LoggingConfig::new().with_enabled(true))
        .build()?;

    let counter = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .route(
            "/items",
            get({
                let counter = counter.clone();
                move || {
                    let counter = counter.clone();
                    async move {
                        let value = counter.fetch_add(1, Ordering::SeqCst) + 1;
                        format!("Hello from backend call #{value}")
                    }
                }
            }),
        )
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_error))
                .layer(cache_layer),
        );

    let addr: SocketAddr = "127.0.0.1:3000".parse()?;
    println!("Listening on http://{addr}");
    println!("curl -i http://{addr}/items?id=1 twice and watch the X-Redis-Cache header.");

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;
    Ok(())
}

async fn handle_error(err: BoxError) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}
