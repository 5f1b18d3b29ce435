use chrono_tz::Asia::Seoul;
use redis::aio::ConnectionManager;
use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use trendrank_core::job_registry::{batch_job_name, JobRegistry, RedisJobRegistry};
use trendrank_core::jobs::{daily, hourly, rollup, weekly_monthly};
use trendrank_core::staging::StagingPublisher;
use trendrank_core::Period;

use crate::metrics;

const JOB_LEASE_SECS: u64 = 10 * 60;

/// Builds and returns the six KST cron jobs of spec.md §4.9. Each job
/// acquires the distributed lock before running and releases it in all
/// outcomes, so a scheduled and an admin-triggered run of the same job
/// never overlap.
pub async fn build(pool: PgPool, redis: ConnectionManager) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    scheduler.add(hourly_job(pool.clone(), redis.clone())).await?;
    scheduler.add(today_rollup_job(pool.clone(), redis.clone())).await?;
    scheduler.add(yesterday_reconciliation_job(pool.clone(), redis.clone())).await?;
    scheduler.add(daily_job(pool.clone(), redis.clone())).await?;
    scheduler.add(weekly_job(pool.clone(), redis.clone())).await?;
    scheduler.add(monthly_job(pool, redis)).await?;

    Ok(scheduler)
}

fn hourly_job(pool: PgPool, redis: ConnectionManager) -> Job {
    Job::new_async_tz("0 */30 * * * *", Seoul, move |_uuid, _sched| {
        let pool = pool.clone();
        let redis = redis.clone();
        Box::pin(async move {
            run_guarded("hourly", "hourly", &redis.clone(), || async {
                let publisher = StagingPublisher::new(redis.clone());
                hourly::run(&pool, &publisher, chrono::Utc::now()).await
            })
            .await
        })
    })
    .expect("valid cron expression")
}

fn today_rollup_job(pool: PgPool, redis: ConnectionManager) -> Job {
    Job::new_async_tz("0 0 1,7,13,19 * * *", Seoul, move |_uuid, _sched| {
        let pool = pool.clone();
        let redis = redis.clone();
        Box::pin(async move {
            run_guarded("rollup-today", "rollup-today", &redis.clone(), || async {
                let today = chrono::Utc::now().with_timezone(&Seoul).date_naive();
                rollup::run(&pool, today).await
            })
            .await
        })
    })
    .expect("valid cron expression")
}

fn yesterday_reconciliation_job(pool: PgPool, redis: ConnectionManager) -> Job {
    Job::new_async_tz("0 0 4 * * *", Seoul, move |_uuid, _sched| {
        let pool = pool.clone();
        let redis = redis.clone();
        Box::pin(async move {
            run_guarded("rollup-yesterday", "rollup-yesterday", &redis.clone(), || async {
                let yesterday = chrono::Utc::now().with_timezone(&Seoul).date_naive() - chrono::Duration::days(1);
                rollup::run(&pool, yesterday).await
            })
            .await
        })
    })
    .expect("valid cron expression")
}

fn daily_job(pool: PgPool, redis: ConnectionManager) -> Job {
    Job::new_async_tz("0 0 1,13 * * *", Seoul, move |_uuid, _sched| {
        let pool = pool.clone();
        let redis = redis.clone();
        Box::pin(async move {
            run_guarded("daily", "daily", &redis.clone(), || async {
                let publisher = StagingPublisher::new(redis.clone());
                let today = chrono::Utc::now().with_timezone(&Seoul).date_naive();
                daily::run(&pool, &publisher, today).await
            })
            .await
        })
    })
    .expect("valid cron expression")
}

fn weekly_job(pool: PgPool, redis: ConnectionManager) -> Job {
    Job::new_async_tz("0 0 2 * * *", Seoul, move |_uuid, _sched| {
        let pool = pool.clone();
        let redis = redis.clone();
        Box::pin(async move {
            let today = chrono::Utc::now().with_timezone(&Seoul).date_naive();
            let lock_key = batch_job_name(Period::Weekly, today);
            run_guarded(&lock_key, "weekly", &redis.clone(), || async {
                weekly_monthly::run_weekly(&pool, today).await
            })
            .await
        })
    })
    .expect("valid cron expression")
}

fn monthly_job(pool: PgPool, redis: ConnectionManager) -> Job {
    Job::new_async_tz("0 0 2 * * *", Seoul, move |_uuid, _sched| {
        let pool = pool.clone();
        let redis = redis.clone();
        Box::pin(async move {
            let today = chrono::Utc::now().with_timezone(&Seoul).date_naive();
            let lock_key = batch_job_name(Period::Monthly, today);
            run_guarded(&lock_key, "monthly", &redis.clone(), || async {
                weekly_monthly::run_monthly(&pool, today).await
            })
            .await
        })
    })
    .expect("valid cron expression")
}

/// Acquires the job lock under `lock_key`, runs `f`, and always releases the
/// lock. `lock_key` carries the base date for weekly/monthly jobs (so a
/// scheduled and an admin-triggered run for the same date contend for the
/// same lock) while `metric_label` stays a fixed, low-cardinality label for
/// Prometheus. `JobAlreadyRunning` is swallowed and logged (spec.md §4.13's
/// `JobInstanceAlreadyComplete` analogue); any other error is logged and
/// does not propagate, so one failing job never takes down the scheduler.
async fn run_guarded<F, Fut>(lock_key: &str, metric_label: &str, redis: &ConnectionManager, f: F)
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = trendrank_core::CoreResult<trendrank_core::jobs::JobReport>>,
{
    let registry = RedisJobRegistry::new(redis.clone());
    if let Err(err) = registry.try_start(lock_key, JOB_LEASE_SECS).await {
        tracing::warn!(job = metric_label, lock_key, error = %err, "job already running, skipping");
        return;
    }

    let start = std::time::Instant::now();
    let result = f().await;
    let _ = registry.finish(lock_key).await;
    let duration_secs = start.elapsed().as_secs_f64();

    match result {
        Ok(report) => {
            tracing::info!(job = metric_label, read = report.read_count, write = report.write_count, "job completed");
            metrics::observe_batch_job(metric_label, "success", duration_secs, report.write_count);
        }
        Err(err) => {
            tracing::error!(job = metric_label, error = %err, "job failed");
            metrics::observe_batch_job(metric_label, "failure", duration_secs, 0);
        }
    }
}
