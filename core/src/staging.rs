use crate::error::CoreResult;
use crate::redis_key::staging;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

const LIVE_TTL_SECS: i64 = 24 * 60 * 60;

/// Writes a new ranking to a staging key, then atomically renames it over
/// the live key. Readers never observe a partially populated ranking: the
/// rename is the publish barrier (spec.md §4.7).
pub struct StagingPublisher {
    conn: ConnectionManager,
}

/// How scores should be written into the staging key.
pub enum WriteMode {
    /// `ZADD`: each `(product_id, score)` is the final score for that
    /// product — used by batch-computed rankings (daily/hourly decay
    /// composition already summed across buckets).
    Overwrite,
    /// `ZINCRBY`: repeated contributions for the same product are summed —
    /// used by the chunk-oriented hourly job's single-row mode.
    Accumulate,
}

impl StagingPublisher {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    /// Publishes `scores` to `live_key`. On an empty iterator, does nothing:
    /// no staging key is created, and the previous live key (if any) is
    /// preserved untouched.
    pub async fn publish<I>(&self, live_key: &str, mode: WriteMode, scores: I) -> CoreResult<()>
    where
        I: IntoIterator<Item = (i64, f64)>,
    {
        let mut scores = scores.into_iter().peekable();
        if scores.peek().is_none() {
            return Ok(());
        }

        let staging_key = staging(live_key);
        let mut conn = self.conn.clone();

        let _: () = conn.del(&staging_key).await?;

        for (product_id, score) in scores {
            match mode {
                WriteMode::Overwrite => {
                    let _: () = conn.zadd(&staging_key, product_id, score).await?;
                }
                WriteMode::Accumulate => {
                    let _: () = conn.zincr(&staging_key, product_id, score).await?;
                }
            }
        }

        let _: () = redis::pipe()
            .atomic()
            .rename(&staging_key, live_key)
            .expire(live_key, LIVE_TTL_SECS)
            .query_async(&mut conn)
            .await?;

        Ok(())
    }
}
