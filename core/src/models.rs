use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Per-product, per-hour accumulated counters. `(stat_hour, product_id)` is
/// unique. `like_count` is signed: likes created in one hour may be
/// canceled in a later hour, so the running total can go negative for a
/// single bucket even though the all-time like count cannot.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize, Deserialize)]
pub struct HourlyMetric {
    pub stat_hour: DateTime<Utc>,
    pub product_id: i64,
    pub view_count: i64,
    pub like_count: i64,
    pub order_amount: Decimal,
}

/// Per-product, per-day accumulated counters, produced by the rollup jobs
/// and otherwise read-only from the ranking pipeline's point of view.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize, Deserialize)]
pub struct DailyMetric {
    pub stat_date: NaiveDate,
    pub product_id: i64,
    pub view_count: i64,
    pub like_count: i64,
    pub order_amount: Decimal,
}

/// A delta to apply to one product's hourly bucket. Produced upstream by
/// the streaming ingest (out of scope here; this is the accumulation
/// contract's input shape).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccumulateMetricsCommand {
    pub stat_hour: DateTime<Utc>,
    pub product_id: i64,
    pub view_delta: i64,
    pub like_created: i64,
    pub like_canceled: i64,
    pub order_amount_delta: Decimal,
}

impl AccumulateMetricsCommand {
    pub fn like_delta(&self) -> i64 {
        self.like_created - self.like_canceled
    }
}

/// `(view_weight, like_weight, order_weight)`. Only the latest non-deleted
/// row is meaningful; updates are modeled as new rows so history is
/// retained.
#[derive(Debug, Clone, Copy, PartialEq, sqlx::FromRow, Serialize, Deserialize)]
pub struct RankingWeight {
    pub id: i64,
    pub view_weight: Decimal,
    pub like_weight: Decimal,
    pub order_weight: Decimal,
}

impl RankingWeight {
    /// Fallback used whenever no weight row exists.
    pub fn fallback() -> Self {
        Self {
            id: 0,
            view_weight: Decimal::new(10, 2),
            like_weight: Decimal::new(20, 2),
            order_weight: Decimal::new(60, 2),
        }
    }
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize, Deserialize)]
pub struct WeeklyRank {
    pub base_date: NaiveDate,
    pub rank: i16,
    pub product_id: i64,
    pub score: Decimal,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize, Deserialize)]
pub struct MonthlyRank {
    pub base_date: NaiveDate,
    pub rank: i16,
    pub product_id: i64,
    pub score: Decimal,
}

/// One ranked entry as returned by the rank reader (C10).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedProduct {
    pub rank: i64,
    pub product_id: i64,
    pub score: Decimal,
}
