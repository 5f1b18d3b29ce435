use crate::{error::ApiError, error::ApiResult, metrics, state::AppState};
use axum::extract::{Path, State};
use axum::Json;
use chrono::{NaiveDate, Utc};
use chrono_tz::Asia::Seoul;
use serde::{Deserialize, Serialize};
use trendrank_core::job_registry::{batch_job_name, JobRegistry};
use trendrank_core::jobs::{weekly_monthly, JobReport};
use trendrank_core::Period;

#[derive(Debug, Deserialize, Default)]
pub struct TriggerBatchRequest {
    #[serde(default, rename = "baseDate")]
    pub base_date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TriggerBatchResponse {
    #[serde(rename = "jobName")]
    pub job_name: String,
    #[serde(rename = "baseDate")]
    pub base_date: String,
    pub status: String,
    #[serde(rename = "startTime")]
    pub start_time: String,
    #[serde(rename = "endTime")]
    pub end_time: String,
    #[serde(rename = "readCount")]
    pub read_count: u64,
    #[serde(rename = "writeCount")]
    pub write_count: u64,
    #[serde(rename = "exitDescription")]
    pub exit_description: String,
}

const JOB_LEASE_SECS: u64 = 15 * 60;

/// `POST /api/v1/admin/batch/rankings/{period}`. Synchronous: the response
/// only returns once the job has completed or failed.
pub async fn trigger_batch(
    State(state): State<AppState>,
    Path(period_raw): Path<String>,
    body: Option<Json<TriggerBatchRequest>>,
) -> ApiResult<Json<TriggerBatchResponse>> {
    let period = Period::parse_strict(&period_raw).map_err(ApiError::from)?;
    if !matches!(period, Period::Weekly | Period::Monthly) {
        return Err(ApiError::invalid_period(format!("batch trigger does not support period: {period_raw}")));
    }

    let base_date = resolve_base_date(body.and_then(|b| b.0.base_date))?;
    let job_name = batch_job_name(period, base_date);

    state.job_registry.try_start(&job_name, JOB_LEASE_SECS).await.map_err(ApiError::from)?;
    let start_time = Utc::now();

    let result: ApiResult<JobReport> = match period {
        Period::Weekly => weekly_monthly::run_weekly(&state.db, base_date).await.map_err(ApiError::from),
        Period::Monthly => weekly_monthly::run_monthly(&state.db, base_date).await.map_err(ApiError::from),
        _ => unreachable!("filtered above"),
    };
    state.job_registry.finish(&job_name).await.map_err(ApiError::from)?;

    let end_time = Utc::now();
    let duration_secs = (end_time - start_time).num_milliseconds() as f64 / 1000.0;

    match result {
        Ok(report) => {
            metrics::observe_batch_job(period.as_str(), "success", duration_secs, report.write_count);
            Ok(Json(TriggerBatchResponse {
                job_name,
                base_date: base_date.format("%Y%m%d").to_string(),
                status: "COMPLETED".to_string(),
                start_time: start_time.to_rfc3339(),
                end_time: end_time.to_rfc3339(),
                read_count: report.read_count,
                write_count: report.write_count,
                exit_description: "ok".to_string(),
            }))
        }
        Err(err) => {
            metrics::observe_batch_job(period.as_str(), "failure", duration_secs, 0);
            Err(err)
        }
    }
}

/// Parses `yyyyMMdd`. Missing/blank defaults to today (KST); a future date
/// is clamped to today; any other malformed input is rejected.
fn resolve_base_date(raw: Option<String>) -> ApiResult<NaiveDate> {
    let today = Utc::now().with_timezone(&Seoul).date_naive();
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(today),
        Some(s) => {
            let parsed = NaiveDate::parse_from_str(s, "%Y%m%d")
                .map_err(|_| ApiError::invalid_date_format(format!("expected yyyyMMdd, got: {s}")))?;
            Ok(parsed.min(today))
        }
    }
}
