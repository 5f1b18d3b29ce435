use axum::{extract::State, routing::get, Json, Router};
use prometheus::Registry;
use std::net::SocketAddr;
use std::time::Instant;

use crate::metrics;

#[derive(Clone)]
struct HealthState {
    started_at: Instant,
    registry: Registry,
}

/// A tiny liveness-only axum app: the worker has no externally callable
/// business routes, but every teacher binary exposes a health/metrics
/// surface, so this carries that ambient convention forward.
pub async fn serve(registry: Registry, addr: SocketAddr) -> anyhow::Result<()> {
    let state = HealthState { started_at: Instant::now(), registry };
    let app = Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("worker health endpoint listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health_check(State(state): State<HealthState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "uptime_secs": state.started_at.elapsed().as_secs(),
    }))
}

async fn metrics_handler(State(state): State<HealthState>) -> String {
    metrics::gather_metrics(&state.registry)
}
