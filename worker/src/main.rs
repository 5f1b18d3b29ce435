mod health;
mod metrics;
mod scheduler;

use anyhow::Result;
use dotenv::dotenv;
use prometheus::Registry;
use redis::aio::ConnectionManager;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "worker=info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let registry = Registry::new_custom(Some("trendrank_worker".into()), None)?;
    metrics::register_all(&registry)?;

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let redis_url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into());

    let pool = PgPoolOptions::new().max_connections(10).connect(&database_url).await?;
    sqlx::migrate!("../core/migrations").run(&pool).await?;
    tracing::info!("database connected and migrations applied");

    let redis_client = redis::Client::open(redis_url)?;
    let redis_conn = ConnectionManager::new(redis_client).await?;
    tracing::info!("redis connection manager established");

    let sched = scheduler::build(pool, redis_conn).await?;
    sched.start().await?;
    tracing::info!("job scheduler started: six KST cron jobs registered");

    let addr = SocketAddr::from(([0, 0, 0, 0], 3002));
    health::serve(registry, addr).await?;

    Ok(())
}
