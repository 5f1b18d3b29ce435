use crate::{error::ApiError, error::ApiResult, metrics, state::AppState};
use axum::extract::State;
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use trendrank_core::repo::WeightRepository;

#[derive(Debug, Serialize)]
pub struct WeightResponse {
    #[serde(rename = "viewWeight")]
    pub view_weight: Decimal,
    #[serde(rename = "likeWeight")]
    pub like_weight: Decimal,
    #[serde(rename = "orderWeight")]
    pub order_weight: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct WeightUpdateRequest {
    #[serde(rename = "viewWeight")]
    pub view_weight: String,
    #[serde(rename = "likeWeight")]
    pub like_weight: String,
    #[serde(rename = "orderWeight")]
    pub order_weight: String,
}

/// `GET /api/v1/rankings/weight`: latest weight row, or the fallback
/// `{0.10, 0.20, 0.60}` triple when none exists (spec.md §8 scenario 5).
pub async fn get_weight(State(state): State<AppState>) -> ApiResult<Json<WeightResponse>> {
    let weight = WeightRepository::new(&state.db).find_latest_or_fallback().await?;
    Ok(Json(WeightResponse {
        view_weight: weight.view_weight,
        like_weight: weight.like_weight,
        order_weight: weight.order_weight,
    }))
}

/// `PUT /api/v1/rankings/weight`: each component parses as a decimal in
/// `[0, 1]`; out of range or unparsable is rejected with 400.
pub async fn put_weight(
    State(state): State<AppState>,
    Json(body): Json<WeightUpdateRequest>,
) -> ApiResult<Json<WeightResponse>> {
    let view_weight = parse_unit_weight(&body.view_weight)?;
    let like_weight = parse_unit_weight(&body.like_weight)?;
    let order_weight = parse_unit_weight(&body.order_weight)?;

    let saved = WeightRepository::new(&state.db).save(view_weight, like_weight, order_weight).await?;
    metrics::RANKING_WEIGHT_UPDATES.inc();

    Ok(Json(WeightResponse {
        view_weight: saved.view_weight,
        like_weight: saved.like_weight,
        order_weight: saved.order_weight,
    }))
}

fn parse_unit_weight(raw: &str) -> ApiResult<Decimal> {
    let value = Decimal::from_str(raw)
        .map_err(|_| ApiError::bad_request("INVALID_WEIGHT", format!("not a decimal: {raw}")))?;
    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(ApiError::bad_request("INVALID_WEIGHT", format!("weight out of range [0,1]: {raw}")));
    }
    Ok(value)
}
