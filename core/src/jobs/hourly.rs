use crate::error::CoreResult;
use crate::jobs::JobReport;
use crate::redis_key;
use crate::repo::{MetricRepository, WeightRepository};
use crate::score_calculator::{raw_score, single_row_contribution};
use crate::staging::{StagingPublisher, WriteMode};
use chrono::{DateTime, Duration, Timelike, Utc};
use futures::StreamExt;
use sqlx::PgPool;

/// Hourly ranking job (C9): one chunked step reading `HourlyMetric` rows
/// for the current-hour + previous-hour window, applying the single-row
/// decay-weighted contribution mode, `ZINCRBY`-ing into the staging key,
/// and renaming to live on completion. `write_count == read_count` because
/// each input row produces exactly one `ZINCRBY` call.
pub async fn run(
    pool: &PgPool,
    publisher: &StagingPublisher,
    base_date_time: DateTime<Utc>,
) -> CoreResult<JobReport> {
    let weight = WeightRepository::new(pool).find_latest_or_fallback().await?;

    let current_hour = base_date_time
        .with_minute(0)
        .unwrap()
        .with_second(0)
        .unwrap()
        .with_nanosecond(0)
        .unwrap();
    let previous_hour = current_hour - Duration::hours(1);
    let window_end = current_hour + Duration::hours(1);

    let metrics = MetricRepository::new(pool);
    let mut stream = metrics.find_by_stat_hour_range(previous_hour, window_end);

    let mut read_count: u64 = 0;
    let mut contributions: Vec<(i64, f64)> = Vec::new();

    while let Some(row) = stream.next().await {
        let row = row?;
        read_count += 1;
        let raw = raw_score(row.view_count, row.like_count, row.order_amount, &weight)?;
        let is_current = row.stat_hour == current_hour;
        let contribution = single_row_contribution(raw, is_current)?;
        contributions.push((row.product_id, contribution.as_f64()));
    }
    drop(stream);

    let write_count = contributions.len() as u64;
    let live_key = redis_key::hourly_key(current_hour);
    publisher.publish(&live_key, WriteMode::Accumulate, contributions).await?;

    Ok(JobReport { read_count, write_count })
}
