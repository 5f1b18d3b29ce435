use crate::error::CoreResult;
use crate::models::{MonthlyRank, WeeklyRank};
use chrono::NaiveDate;
use sqlx::PgPool;

const BATCH_SIZE: usize = 100;

/// Delete-then-batch-insert materialized weekly/monthly rankings. Empty
/// input is a no-op and must not delete — callers should only reach here
/// once rows to insert actually exist.
pub struct RankTableRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RankTableRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn replace_weekly(&self, base_date: NaiveDate, rows: &[WeeklyRank]) -> CoreResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM mv_product_rank_weekly WHERE base_date = $1")
            .bind(base_date)
            .execute(&mut *tx)
            .await?;
        for chunk in rows.chunks(BATCH_SIZE) {
            for row in chunk {
                sqlx::query(
                    "INSERT INTO mv_product_rank_weekly (base_date, rank, product_id, score)
                     VALUES ($1, $2, $3, $4)",
                )
                .bind(row.base_date)
                .bind(row.rank)
                .bind(row.product_id)
                .bind(row.score)
                .execute(&mut *tx)
                .await?;
            }
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn replace_monthly(&self, base_date: NaiveDate, rows: &[MonthlyRank]) -> CoreResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM mv_product_rank_monthly WHERE base_date = $1")
            .bind(base_date)
            .execute(&mut *tx)
            .await?;
        for chunk in rows.chunks(BATCH_SIZE) {
            for row in chunk {
                sqlx::query(
                    "INSERT INTO mv_product_rank_monthly (base_date, rank, product_id, score)
                     VALUES ($1, $2, $3, $4)",
                )
                .bind(row.base_date)
                .bind(row.rank)
                .bind(row.product_id)
                .bind(row.score)
                .execute(&mut *tx)
                .await?;
            }
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn find_rank_weekly(&self, base_date: NaiveDate, product_id: i64) -> CoreResult<Option<i16>> {
        let rank: Option<(i16,)> = sqlx::query_as(
            "SELECT rank FROM mv_product_rank_weekly WHERE base_date = $1 AND product_id = $2",
        )
        .bind(base_date)
        .bind(product_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(rank.map(|(r,)| r))
    }

    pub async fn find_rank_monthly(&self, base_date: NaiveDate, product_id: i64) -> CoreResult<Option<i16>> {
        let rank: Option<(i16,)> = sqlx::query_as(
            "SELECT rank FROM mv_product_rank_monthly WHERE base_date = $1 AND product_id = $2",
        )
        .bind(base_date)
        .bind(product_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(rank.map(|(r,)| r))
    }

    pub async fn count_weekly(&self, base_date: NaiveDate) -> CoreResult<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM mv_product_rank_weekly WHERE base_date = $1")
                .bind(base_date)
                .fetch_one(self.pool)
                .await?;
        Ok(count)
    }

    pub async fn count_monthly(&self, base_date: NaiveDate) -> CoreResult<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM mv_product_rank_monthly WHERE base_date = $1")
                .bind(base_date)
                .fetch_one(self.pool)
                .await?;
        Ok(count)
    }

    pub async fn page_weekly(&self, base_date: NaiveDate, offset: i64, limit: i64) -> CoreResult<Vec<WeeklyRank>> {
        let rows = sqlx::query_as::<_, WeeklyRank>(
            "SELECT base_date, rank, product_id, score FROM mv_product_rank_weekly
             WHERE base_date = $1 ORDER BY rank ASC OFFSET $2 LIMIT $3",
        )
        .bind(base_date)
        .bind(offset)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn page_monthly(&self, base_date: NaiveDate, offset: i64, limit: i64) -> CoreResult<Vec<MonthlyRank>> {
        let rows = sqlx::query_as::<_, MonthlyRank>(
            "SELECT base_date, rank, product_id, score FROM mv_product_rank_monthly
             WHERE base_date = $1 ORDER BY rank ASC OFFSET $2 LIMIT $3",
        )
        .bind(base_date)
        .bind(offset)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }
}

/// Assigns ranks 1..≤100 strictly by descending score, ties broken by
/// ascending `product_id` for determinism.
pub fn assign_ranks(mut scored: Vec<(i64, rust_decimal::Decimal)>) -> Vec<(i16, i64, rust_decimal::Decimal)> {
    scored.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    scored
        .into_iter()
        .take(100)
        .enumerate()
        .map(|(i, (product_id, score))| ((i + 1) as i16, product_id, score))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn ranks_are_contiguous_and_tie_broken_by_product_id() {
        let scored = vec![(3, dec!(10)), (1, dec!(10)), (2, dec!(20))];
        let ranked = assign_ranks(scored);
        assert_eq!(ranked[0], (1, 2, dec!(20)));
        assert_eq!(ranked[1], (2, 1, dec!(10)));
        assert_eq!(ranked[2], (3, 3, dec!(10)));
    }

    #[test]
    fn caps_at_100() {
        let scored: Vec<_> = (0..150).map(|i| (i as i64, dec!(1))).collect();
        let ranked = assign_ranks(scored);
        assert_eq!(ranked.len(), 100);
        assert_eq!(ranked.last().unwrap().0, 100);
    }
}
