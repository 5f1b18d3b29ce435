use crate::error::CoreResult;
use crate::models::RankingWeight;
use rust_decimal::Decimal;
use sqlx::PgPool;

/// Read/write of the current `(view, like, order)` weight triple. Updates
/// are modeled as new rows — history is retained — so `find_latest` always
/// asks for the highest-id non-soft-deleted row.
pub struct WeightRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WeightRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_latest(&self) -> CoreResult<Option<RankingWeight>> {
        let row = sqlx::query_as::<_, RankingWeight>(
            r#"
            SELECT id, view_weight, like_weight, order_weight
            FROM ranking_weight
            WHERE deleted_at IS NULL
            ORDER BY id DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }

    /// The ranking pipeline always reads `find_latest() ?? fallback()`.
    pub async fn find_latest_or_fallback(&self) -> CoreResult<RankingWeight> {
        Ok(self.find_latest().await?.unwrap_or_else(RankingWeight::fallback))
    }

    pub async fn save(
        &self,
        view_weight: Decimal,
        like_weight: Decimal,
        order_weight: Decimal,
    ) -> CoreResult<RankingWeight> {
        let row = sqlx::query_as::<_, RankingWeight>(
            r#"
            INSERT INTO ranking_weight (view_weight, like_weight, order_weight)
            VALUES ($1, $2, $3)
            RETURNING id, view_weight, like_weight, order_weight
            "#,
        )
        .bind(view_weight)
        .bind(like_weight)
        .bind(order_weight)
        .fetch_one(self.pool)
        .await?;
        Ok(row)
    }
}
