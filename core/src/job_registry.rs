use crate::error::{CoreError, CoreResult};
use crate::period::Period;
use async_trait::async_trait;
use chrono::NaiveDate;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

/// The job-lock key a weekly/monthly batch run registers under, shared by
/// the `worker` scheduler and the `api` admin-trigger path so a scheduled
/// and a manually-triggered run for the same `(period, base_date)` always
/// contend for the same lock.
pub fn batch_job_name(period: Period, base_date: NaiveDate) -> String {
    format!("{}-{}", period.as_str(), base_date.format("%Y%m%d"))
}

/// Tracks in-flight job executions so the orchestrator never starts the
/// same job twice for the same parameters — across both the scheduled
/// worker and the synchronous admin-trigger HTTP path, which run in
/// different processes sharing one Redis (spec.md §4.9, §4.12).
#[async_trait]
pub trait JobRegistry: Send + Sync {
    /// Attempts to mark `job_key` as running. Returns `Ok(())` on success,
    /// `Err(JobAlreadyRunning)` if another execution already holds the key.
    async fn try_start(&self, job_key: &str, lease_secs: u64) -> CoreResult<()>;

    /// Releases the lease. Safe to call even if the lease already expired.
    async fn finish(&self, job_key: &str) -> CoreResult<()>;
}

pub struct RedisJobRegistry {
    conn: ConnectionManager,
}

impl RedisJobRegistry {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    fn lock_key(job_key: &str) -> String {
        format!("ranking:job-lock:{job_key}")
    }
}

#[async_trait]
impl JobRegistry for RedisJobRegistry {
    async fn try_start(&self, job_key: &str, lease_secs: u64) -> CoreResult<()> {
        let mut conn = self.conn.clone();
        let key = Self::lock_key(job_key);
        let acquired: bool = redis::cmd("SET")
            .arg(&key)
            .arg("1")
            .arg("NX")
            .arg("EX")
            .arg(lease_secs)
            .query_async::<_, Option<String>>(&mut conn)
            .await?
            .is_some();
        if acquired {
            Ok(())
        } else {
            Err(CoreError::JobAlreadyRunning(job_key.to_string()))
        }
    }

    async fn finish(&self, job_key: &str) -> CoreResult<()> {
        let mut conn = self.conn.clone();
        let key = Self::lock_key(job_key);
        let _: () = conn.del(&key).await?;
        Ok(())
    }
}
