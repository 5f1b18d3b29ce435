use crate::product_cache::ProductCache;
use crate::product_store::HttpProductStore;
use prometheus::Registry;
use redis::aio::ConnectionManager;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::{Duration, Instant};
use trendrank_core::job_registry::RedisJobRegistry;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub redis: ConnectionManager,
    pub started_at: Instant,
    pub cache: Arc<ProductCache>,
    pub product_store: Arc<HttpProductStore>,
    pub job_registry: Arc<RedisJobRegistry>,
    pub registry: Registry,
}

impl AppState {
    pub fn new(db: PgPool, redis: ConnectionManager, registry: Registry, product_service_url: String) -> Self {
        Self {
            db,
            job_registry: Arc::new(RedisJobRegistry::new(redis.clone())),
            cache: Arc::new(ProductCache::new(10_000, Duration::from_secs(60))),
            product_store: Arc::new(HttpProductStore::new(product_service_url)),
            redis,
            started_at: Instant::now(),
            registry,
        }
    }
}
