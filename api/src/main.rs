mod error;
mod handlers;
mod metrics;
mod observability;
mod product_cache;
mod product_store;
mod rank_reader;
mod routes;
mod state;

use anyhow::Result;
use axum::http::{header, HeaderValue, Method};
use axum::{middleware, Router};
use dotenv::dotenv;
use redis::aio::ConnectionManager;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;

use crate::observability::Observability;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let obs = Observability::init()?;

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let redis_url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into());

    let pool = PgPoolOptions::new().max_connections(10).connect(&database_url).await?;

    sqlx::migrate!("../core/migrations").run(&pool).await?;
    tracing::info!("database connected and migrations applied");

    let redis_client = redis::Client::open(redis_url)?;
    let redis_conn = ConnectionManager::new(redis_client).await?;
    tracing::info!("redis connection manager established");

    let product_service_url =
        std::env::var("PRODUCT_SERVICE_URL").unwrap_or_else(|_| "http://localhost:8080".into());
    let state = AppState::new(pool, redis_conn, obs.registry, product_service_url);

    let cors = CorsLayer::new()
        .allow_origin([HeaderValue::from_static("http://localhost:3000")])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let app = Router::new()
        .merge(routes::ranking_routes())
        .merge(routes::weight_routes())
        .merge(routes::admin_routes())
        .merge(routes::product_routes())
        .merge(routes::health_routes())
        .layer(middleware::from_fn(request_logger))
        .layer(cors)
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], 3001));
    tracing::info!("ranking API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Observability::shutdown();
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c().await.expect("failed to install SIGINT handler");
    tracing::info!("shutdown signal received");
}

async fn request_logger(
    req: axum::http::Request<axum::body::Body>,
    next: middleware::Next,
) -> axum::response::Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let start = std::time::Instant::now();

    let response = next.run(req).await;

    let elapsed = start.elapsed();
    let status = response.status().as_u16();
    metrics::observe_http(method.as_str(), uri.path(), status, elapsed.as_secs_f64());
    tracing::info!("{method} {uri} {status} {}ms", elapsed.as_millis());

    response
}
