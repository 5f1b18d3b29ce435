use chrono::Utc;
use chrono_tz::Asia::Seoul;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use rust_decimal::prelude::*;
use sqlx::PgPool;
use trendrank_core::models::RankedProduct;
use trendrank_core::repo::RankTableRepository;
use trendrank_core::{redis_key, CoreResult, Period};

/// Query the rank of a single product, or the top-N ranked products for a
/// period, across Redis (HOURLY/DAILY) and Postgres (WEEKLY/MONTHLY).
/// Shared by the ranking query API and the product-detail composer (C11).
pub struct RankReader<'a> {
    pool: &'a PgPool,
    redis: ConnectionManager,
}

impl<'a> RankReader<'a> {
    pub fn new(pool: &'a PgPool, redis: ConnectionManager) -> Self {
        Self { pool, redis }
    }

    pub async fn find_rank(&self, period: Period, product_id: i64) -> CoreResult<Option<i64>> {
        match period {
            Period::Hourly | Period::Daily => {
                let key = live_key(period);
                let mut conn = self.redis.clone();
                let rank: Option<i64> = conn.zrevrank(&key, product_id).await?;
                Ok(rank.map(|r| r + 1))
            }
            Period::Weekly => {
                let base_date = today_kst();
                let rank = RankTableRepository::new(self.pool)
                    .find_rank_weekly(base_date, product_id)
                    .await?;
                Ok(rank.map(i64::from))
            }
            Period::Monthly => {
                let base_date = today_kst();
                let rank = RankTableRepository::new(self.pool)
                    .find_rank_monthly(base_date, product_id)
                    .await?;
                Ok(rank.map(i64::from))
            }
        }
    }

    pub async fn find_top_n(&self, period: Period, page: u32, size: u32) -> CoreResult<(Vec<RankedProduct>, bool)> {
        let start = (page as i64) * (size as i64);
        let end = start + (size as i64) - 1;

        match period {
            Period::Hourly | Period::Daily => {
                let key = live_key(period);
                let mut conn = self.redis.clone();
                let members: Vec<(i64, f64)> = conn.zrevrange_withscores(&key, start as isize, end as isize).await?;
                let total: i64 = conn.zcard(&key).await?;
                let has_next = total > end + 1;
                let items = members
                    .into_iter()
                    .enumerate()
                    .map(|(i, (product_id, score))| RankedProduct {
                        rank: start + i as i64 + 1,
                        product_id,
                        score: Decimal::from_f64(score).unwrap_or(Decimal::ZERO),
                    })
                    .collect();
                Ok((items, has_next))
            }
            Period::Weekly => {
                let base_date = today_kst();
                let repo = RankTableRepository::new(self.pool);
                let rows = repo.page_weekly(base_date, start, size as i64).await?;
                let total = repo.count_weekly(base_date).await?;
                let has_next = total > end + 1;
                let items = rows
                    .into_iter()
                    .map(|r| RankedProduct { rank: r.rank as i64, product_id: r.product_id, score: r.score })
                    .collect();
                Ok((items, has_next))
            }
            Period::Monthly => {
                let base_date = today_kst();
                let repo = RankTableRepository::new(self.pool);
                let rows = repo.page_monthly(base_date, start, size as i64).await?;
                let total = repo.count_monthly(base_date).await?;
                let has_next = total > end + 1;
                let items = rows
                    .into_iter()
                    .map(|r| RankedProduct { rank: r.rank as i64, product_id: r.product_id, score: r.score })
                    .collect();
                Ok((items, has_next))
            }
        }
    }
}

fn live_key(period: Period) -> String {
    let now = Utc::now();
    redis_key::current_bucket_key(period, now).expect("hourly/daily always produce a key")
}

fn today_kst() -> chrono::NaiveDate {
    Utc::now().with_timezone(&Seoul).date_naive()
}
