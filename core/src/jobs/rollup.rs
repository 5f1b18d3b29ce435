use crate::error::CoreResult;
use crate::jobs::JobReport;
use crate::models::DailyMetric;
use crate::repo::MetricRepository;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Asia::Seoul;
use futures::StreamExt;
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::collections::HashMap;

/// Both the today-rollup and yesterday-reconciliation jobs share this: sum
/// all hourly rows falling within the KST calendar day `base_date` and
/// upsert the totals into `DailyMetric`. Idempotent — re-running overwrites
/// the same `(stat_date, product_id)` rows rather than duplicating them.
pub async fn run(pool: &PgPool, base_date: NaiveDate) -> CoreResult<JobReport> {
    let day_start_kst = Seoul.from_local_datetime(&base_date.and_hms_opt(0, 0, 0).unwrap()).unwrap();
    let window_start: DateTime<Utc> = day_start_kst.with_timezone(&Utc);
    let window_end = window_start + Duration::days(1);

    let metrics = MetricRepository::new(pool);
    let mut stream = metrics.find_by_stat_hour_range(window_start, window_end);

    let mut read_count: u64 = 0;
    let mut totals: HashMap<i64, (i64, i64, Decimal)> = HashMap::new();

    while let Some(row) = stream.next().await {
        let row = row?;
        read_count += 1;
        let entry = totals.entry(row.product_id).or_insert((0, 0, Decimal::ZERO));
        entry.0 += row.view_count;
        entry.1 += row.like_count;
        entry.2 += row.order_amount;
    }
    drop(stream);

    let write_count = totals.len() as u64;
    for (product_id, (view_count, like_count, order_amount)) in totals {
        metrics
            .upsert_daily(&DailyMetric {
                stat_date: base_date,
                product_id,
                view_count,
                like_count,
                order_amount,
            })
            .await?;
    }

    Ok(JobReport { read_count, write_count })
}
