use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;
use trendrank_core::jobs::weekly_monthly;

async fn seed_daily_metric(pool: &PgPool, stat_date: NaiveDate, product_id: i64, views: i64, likes: i64, order_amount: i64) {
    sqlx::query(
        "INSERT INTO product_daily_metric (stat_date, product_id, view_count, like_count, order_amount)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(stat_date)
    .bind(product_id)
    .bind(views)
    .bind(likes)
    .bind(Decimal::from(order_amount))
    .execute(pool)
    .await
    .unwrap();
}

/// spec.md §8 scenario 6: calling the weekly trigger twice for the same
/// baseDate leaves `mv_product_rank_weekly` with exactly the same rows as
/// after the first call (delete-then-insert semantics, not duplication).
#[sqlx::test]
async fn weekly_trigger_is_idempotent(pool: PgPool) {
    let base_date = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
    for day_offset in 0..7 {
        let day = base_date - chrono::Duration::days(day_offset);
        seed_daily_metric(&pool, day, 1, 100, 10, 50).await;
        seed_daily_metric(&pool, day, 2, 50, 5, 10).await;
    }

    weekly_monthly::run_weekly(&pool, base_date).await.unwrap();
    let first: Vec<(i16, i64, Decimal)> = sqlx::query_as(
        "SELECT rank, product_id, score FROM mv_product_rank_weekly WHERE base_date = $1 ORDER BY rank",
    )
    .bind(base_date)
    .fetch_all(&pool)
    .await
    .unwrap();

    weekly_monthly::run_weekly(&pool, base_date).await.unwrap();
    let second: Vec<(i16, i64, Decimal)> = sqlx::query_as(
        "SELECT rank, product_id, score FROM mv_product_rank_weekly WHERE base_date = $1 ORDER BY rank",
    )
    .bind(base_date)
    .fetch_all(&pool)
    .await
    .unwrap();

    assert!(!first.is_empty());
    assert_eq!(first, second);
}

/// spec.md §8 scenario 3: an empty metric window produces no ranking rows
/// and does not error.
#[sqlx::test]
async fn empty_window_produces_no_rows(pool: PgPool) {
    let base_date = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
    let report = weekly_monthly::run_weekly(&pool, base_date).await.unwrap();
    assert_eq!(report.write_count, 0);

    let rows: Vec<(i16,)> =
        sqlx::query_as("SELECT rank FROM mv_product_rank_weekly WHERE base_date = $1").bind(base_date).fetch_all(&pool).await.unwrap();
    assert!(rows.is_empty());
}
