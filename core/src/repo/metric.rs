use crate::error::CoreResult;
use crate::models::{AccumulateMetricsCommand, DailyMetric, HourlyMetric};
use chrono::{DateTime, NaiveDate, Utc};
use futures::stream::BoxStream;
use futures::StreamExt;
use sqlx::PgPool;

/// Time-bucketed per-product counters. `batch_accumulate_counts` is the
/// idempotent upsert contract described in spec.md §4.5: atomic per row,
/// commutative across calls.
pub struct MetricRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> MetricRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Upsert-increment against `(stat_hour, product_id)`. Empty input is a
    /// no-op. Each row is applied with one `INSERT ... ON CONFLICT ... DO
    /// UPDATE` statement inside a single transaction, so the whole batch is
    /// atomic, but the final per-row state does not depend on statement
    /// ordering within the batch (addition is commutative).
    pub async fn batch_accumulate_counts(
        &self,
        commands: &[AccumulateMetricsCommand],
    ) -> CoreResult<()> {
        if commands.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for cmd in commands {
            sqlx::query(
                r#"
                INSERT INTO product_hourly_metric
                    (stat_hour, product_id, view_count, like_count, order_amount)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (stat_hour, product_id) DO UPDATE SET
                    view_count    = product_hourly_metric.view_count + excluded.view_count,
                    like_count    = product_hourly_metric.like_count + excluded.like_count,
                    order_amount  = product_hourly_metric.order_amount + excluded.order_amount
                "#,
            )
            .bind(cmd.stat_hour)
            .bind(cmd.product_id)
            .bind(cmd.view_delta)
            .bind(cmd.like_delta())
            .bind(cmd.order_amount_delta)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Streams all rows for a given hour. May be hundreds of thousands of
    /// products, so this never collects into a `Vec`.
    pub fn find_by_stat_hour(
        &self,
        stat_hour: DateTime<Utc>,
    ) -> BoxStream<'_, Result<HourlyMetric, sqlx::Error>> {
        sqlx::query_as::<_, HourlyMetric>(
            "SELECT stat_hour, product_id, view_count, like_count, order_amount
             FROM product_hourly_metric WHERE stat_hour = $1",
        )
        .bind(stat_hour)
        .fetch(self.pool)
        .boxed()
    }

    /// Streams all rows for `[start, end)` hours, e.g. all hours of a day.
    pub fn find_by_stat_hour_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> BoxStream<'_, Result<HourlyMetric, sqlx::Error>> {
        sqlx::query_as::<_, HourlyMetric>(
            "SELECT stat_hour, product_id, view_count, like_count, order_amount
             FROM product_hourly_metric WHERE stat_hour >= $1 AND stat_hour < $2",
        )
        .bind(start)
        .bind(end)
        .fetch(self.pool)
        .boxed()
    }

    pub fn find_by_stat_date(
        &self,
        stat_date: NaiveDate,
    ) -> BoxStream<'_, Result<DailyMetric, sqlx::Error>> {
        sqlx::query_as::<_, DailyMetric>(
            "SELECT stat_date, product_id, view_count, like_count, order_amount
             FROM product_daily_metric WHERE stat_date = $1",
        )
        .bind(stat_date)
        .fetch(self.pool)
        .boxed()
    }

    pub fn find_by_stat_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> BoxStream<'_, Result<DailyMetric, sqlx::Error>> {
        sqlx::query_as::<_, DailyMetric>(
            "SELECT stat_date, product_id, view_count, like_count, order_amount
             FROM product_daily_metric WHERE stat_date >= $1 AND stat_date <= $2",
        )
        .bind(start)
        .bind(end)
        .fetch(self.pool)
        .boxed()
    }

    /// Upsert a day's rolled-up totals (produced by the rollup jobs from
    /// hourly rows). Idempotent: re-running overwrites, not duplicates.
    pub async fn upsert_daily(&self, metric: &DailyMetric) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO product_daily_metric
                (stat_date, product_id, view_count, like_count, order_amount)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (stat_date, product_id) DO UPDATE SET
                view_count   = excluded.view_count,
                like_count   = excluded.like_count,
                order_amount = excluded.order_amount
            "#,
        )
        .bind(metric.stat_date)
        .bind(metric.product_id)
        .bind(metric.view_count)
        .bind(metric.like_count)
        .bind(metric.order_amount)
        .execute(self.pool)
        .await?;
        Ok(())
    }
}
