use crate::error::CoreResult;
use crate::jobs::JobReport;
use crate::models::{MonthlyRank, WeeklyRank};
use crate::repo::{MetricRepository, RankTableRepository, WeightRepository};
use crate::score::Score;
use crate::score_calculator::{decayed_score, raw_score};
use chrono::{Duration, NaiveDate};
use futures::StreamExt;
use sqlx::PgPool;
use std::collections::HashMap;

/// Generalizes the two-bucket decay formula to N daily buckets: the most
/// recent day in the window is the "current" side (weight 0.9), and the
/// per-product sum of every earlier day's raw score is the "previous" side
/// (weight 0.1). See DESIGN.md for why this resolution of the N-bucket
/// open question was chosen over summing independently-decayed per-day
/// scores.
async fn compute_scores(
    pool: &PgPool,
    base_date: NaiveDate,
    window_days: i64,
) -> CoreResult<(u64, Vec<(i64, Score)>)> {
    let weight = WeightRepository::new(pool).find_latest_or_fallback().await?;
    let metrics = MetricRepository::new(pool);

    let mut read_count: u64 = 0;
    let mut latest: HashMap<i64, Score> = HashMap::new();
    let mut rest: HashMap<i64, Score> = HashMap::new();

    let mut stream = metrics.find_by_stat_date(base_date);
    while let Some(row) = stream.next().await {
        let row = row?;
        read_count += 1;
        let score = raw_score(row.view_count, row.like_count, row.order_amount, &weight)?;
        latest.insert(row.product_id, score);
    }
    drop(stream);

    let earliest = base_date - Duration::days(window_days - 1);
    let mut stream = metrics.find_by_stat_date_range(earliest, base_date - Duration::days(1));
    while let Some(row) = stream.next().await {
        let row = row?;
        read_count += 1;
        let score = raw_score(row.view_count, row.like_count, row.order_amount, &weight)?;
        let entry = rest.entry(row.product_id).or_insert_with(Score::zero);
        *entry = entry.add(score);
    }
    drop(stream);

    let mut product_ids: Vec<i64> = latest.keys().chain(rest.keys()).copied().collect();
    product_ids.sort_unstable();
    product_ids.dedup();

    let mut scored = Vec::with_capacity(product_ids.len());
    for product_id in product_ids {
        let final_score = decayed_score(latest.get(&product_id).copied(), rest.get(&product_id).copied())?;
        scored.push((product_id, final_score));
    }

    Ok((read_count, scored))
}

fn to_decimal_pairs(scored: Vec<(i64, Score)>) -> Vec<(i64, rust_decimal::Decimal)> {
    scored.into_iter().map(|(id, s)| (id, s.value())).collect()
}

/// Weekly ranking job (C9): last 7 days, top-100 by (score desc, product_id
/// asc), delete-then-insert into `mv_product_rank_weekly`.
pub async fn run_weekly(pool: &PgPool, base_date: NaiveDate) -> CoreResult<JobReport> {
    let (read_count, scored) = compute_scores(pool, base_date, 7).await?;
    let ranked = crate::repo::rank_table::assign_ranks(to_decimal_pairs(scored));
    let rows: Vec<WeeklyRank> = ranked
        .into_iter()
        .map(|(rank, product_id, score)| WeeklyRank { base_date, rank, product_id, score })
        .collect();
    let write_count = rows.len() as u64;
    RankTableRepository::new(pool).replace_weekly(base_date, &rows).await?;
    Ok(JobReport { read_count, write_count })
}

/// Monthly ranking job (C9): last 30 days, same ranking rule, writing to
/// `mv_product_rank_monthly`.
pub async fn run_monthly(pool: &PgPool, base_date: NaiveDate) -> CoreResult<JobReport> {
    let (read_count, scored) = compute_scores(pool, base_date, 30).await?;
    let ranked = crate::repo::rank_table::assign_ranks(to_decimal_pairs(scored));
    let rows: Vec<MonthlyRank> = ranked
        .into_iter()
        .map(|(rank, product_id, score)| MonthlyRank { base_date, rank, product_id, score })
        .collect();
    let write_count = rows.len() as u64;
    RankTableRepository::new(pool).replace_monthly(base_date, &rows).await?;
    Ok(JobReport { read_count, write_count })
}
