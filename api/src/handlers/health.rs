use crate::{metrics, state::AppState};
use axum::{extract::State, http::StatusCode, Json};

/// Probes DB connectivity and reports uptime. 200 when reachable, 503 when
/// the pool cannot satisfy a trivial query.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let uptime = state.started_at.elapsed().as_secs();
    let now = chrono::Utc::now().to_rfc3339();

    let db_ok = sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(&state.db).await.is_ok();

    let detail_hit_rate = state.cache.detail_metrics.hit_rate();
    let list_hit_rate = state.cache.list_metrics.hit_rate();

    if db_ok {
        (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "ok",
                "timestamp": now,
                "uptime_secs": uptime,
                "cache": { "detailHitRate": detail_hit_rate, "listHitRate": list_hit_rate },
            })),
        )
    } else {
        tracing::warn!(uptime_secs = uptime, "health check degraded: db unreachable");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "status": "degraded", "timestamp": now, "uptime_secs": uptime })),
        )
    }
}

pub async fn metrics_handler(State(state): State<AppState>) -> String {
    metrics::gather_metrics(&state.registry)
}
