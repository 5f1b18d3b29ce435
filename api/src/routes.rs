use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, state::AppState};

pub fn ranking_routes() -> Router<AppState> {
    Router::new().route("/api/v1/rankings", get(handlers::ranking::get_rankings))
}

pub fn weight_routes() -> Router<AppState> {
    Router::new().route(
        "/api/v1/rankings/weight",
        get(handlers::weight::get_weight).put(handlers::weight::put_weight),
    )
}

pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/api/v1/admin/batch/rankings/:period", post(handlers::admin::trigger_batch))
}

pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/products", get(handlers::product::list_products))
        .route("/api/v1/products/:id", get(handlers::product::get_product))
}

pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::health::metrics_handler))
}
