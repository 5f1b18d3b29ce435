use crate::{error::ApiResult, metrics, state::AppState};
use axum::extract::{Query, State};
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use trendrank_core::models::RankedProduct;
use trendrank_core::Period;

use crate::rank_reader::RankReader;

#[derive(Debug, Deserialize)]
pub struct RankingQuery {
    #[serde(default)]
    pub period: Option<String>,
    /// Accepted for API compatibility; hourly/daily periods always use "now"
    /// and weekly/monthly always use today's KST date, so this is never read.
    #[allow(dead_code)]
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub size: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct RankingEntry {
    pub rank: i64,
    #[serde(rename = "productId")]
    pub product_id: i64,
    pub score: Decimal,
}

impl From<RankedProduct> for RankingEntry {
    fn from(r: RankedProduct) -> Self {
        Self { rank: r.rank, product_id: r.product_id, score: r.score }
    }
}

#[derive(Debug, Serialize)]
pub struct RankingResponse {
    pub rankings: Vec<RankingEntry>,
    #[serde(rename = "hasNext")]
    pub has_next: bool,
}

/// `GET /api/v1/rankings`. `date` is accepted but ignored — hourly/daily
/// always query "now", weekly/monthly always query "today" (spec.md §6).
pub async fn get_rankings(
    State(state): State<AppState>,
    Query(query): Query<RankingQuery>,
) -> ApiResult<Json<RankingResponse>> {
    let period: Period = query.period.as_deref().unwrap_or("hourly").parse().unwrap_or(Period::Hourly);
    let page = query.page.unwrap_or(0);
    let size = query.size.unwrap_or(20).max(1);

    let reader = RankReader::new(&state.db, state.redis.clone());
    let (items, has_next) = reader.find_top_n(period, page, size).await?;

    metrics::RANKING_QUERIES_TOTAL.with_label_values(&[period_label(period)]).inc();

    Ok(Json(RankingResponse {
        rankings: items.into_iter().map(RankingEntry::from).collect(),
        has_next,
    }))
}

fn period_label(period: Period) -> &'static str {
    match period {
        Period::Hourly => "hourly",
        Period::Daily => "daily",
        Period::Weekly => "weekly",
        Period::Monthly => "monthly",
    }
}
