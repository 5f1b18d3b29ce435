use crate::error::CoreResult;
use crate::jobs::JobReport;
use crate::redis_key;
use crate::repo::{MetricRepository, WeightRepository};
use crate::score::Score;
use crate::score_calculator::{decayed_score, raw_score};
use crate::staging::{StagingPublisher, WriteMode};
use chrono::{Duration, NaiveDate};
use futures::StreamExt;
use sqlx::PgPool;
use std::collections::HashMap;

/// Daily ranking job (C9): combines today's and yesterday's `DailyMetric`
/// rows with the same 0.9/0.1 decay composition as the hourly job, writing
/// the result to the Redis live `daily:yyyyMMdd` key for `base_date`.
pub async fn run(pool: &PgPool, publisher: &StagingPublisher, base_date: NaiveDate) -> CoreResult<JobReport> {
    let weight = WeightRepository::new(pool).find_latest_or_fallback().await?;
    let metrics = MetricRepository::new(pool);

    let mut read_count: u64 = 0;
    let mut raw_current: HashMap<i64, Score> = HashMap::new();
    let mut stream = metrics.find_by_stat_date(base_date);
    while let Some(row) = stream.next().await {
        let row = row?;
        read_count += 1;
        let score = raw_score(row.view_count, row.like_count, row.order_amount, &weight)?;
        raw_current.insert(row.product_id, score);
    }
    drop(stream);

    let mut raw_previous: HashMap<i64, Score> = HashMap::new();
    let mut stream = metrics.find_by_stat_date(base_date - Duration::days(1));
    while let Some(row) = stream.next().await {
        let row = row?;
        read_count += 1;
        let score = raw_score(row.view_count, row.like_count, row.order_amount, &weight)?;
        raw_previous.insert(row.product_id, score);
    }
    drop(stream);

    let mut product_ids: Vec<i64> = raw_current.keys().chain(raw_previous.keys()).copied().collect();
    product_ids.sort_unstable();
    product_ids.dedup();

    let mut entries: Vec<(i64, f64)> = Vec::with_capacity(product_ids.len());
    for product_id in product_ids {
        let final_score = decayed_score(raw_current.get(&product_id).copied(), raw_previous.get(&product_id).copied())?;
        entries.push((product_id, final_score.as_f64()));
    }

    let write_count = entries.len() as u64;
    let live_key = redis_key::daily_key(base_date);
    publisher.publish(&live_key, WriteMode::Overwrite, entries).await?;

    Ok(JobReport { read_count, write_count })
}
