use once_cell::sync::Lazy;
use prometheus::{
    opts, Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Registry, TextEncoder,
};

macro_rules! counter_vec {
    ($name:expr, $help:expr, $labels:expr) => {
        Lazy::new(|| IntCounterVec::new(opts!($name, $help), $labels).unwrap())
    };
}
macro_rules! histogram_vec {
    ($name:expr, $help:expr, $labels:expr) => {
        Lazy::new(|| {
            HistogramVec::new(HistogramOpts::new($name, $help).buckets(LATENCY_BUCKETS.to_vec()), $labels)
                .unwrap()
        })
    };
}
macro_rules! counter {
    ($name:expr, $help:expr) => {
        Lazy::new(|| IntCounter::new($name, $help).unwrap())
    };
}
macro_rules! gauge {
    ($name:expr, $help:expr) => {
        Lazy::new(|| IntGauge::new($name, $help).unwrap())
    };
}

const LATENCY_BUCKETS: [f64; 14] = [
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0,
];

// ── HTTP ────────────────────────────────────────────────────────────────────
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> =
    counter_vec!("http_requests_total", "Total HTTP requests", &["method", "path", "status"]);
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> =
    histogram_vec!("http_request_duration_seconds", "HTTP request latency", &["method", "path"]);
pub static HTTP_IN_FLIGHT: Lazy<IntGauge> = gauge!("http_requests_in_flight", "In-flight HTTP requests");

// ── Ranking ─────────────────────────────────────────────────────────────────
pub static RANKING_QUERIES_TOTAL: Lazy<IntCounterVec> =
    counter_vec!("ranking_queries_total", "Ranking queries by period", &["period"]);
pub static RANKING_WEIGHT_UPDATES: Lazy<IntCounter> =
    counter!("ranking_weight_updates_total", "Ranking weight updates");

// ── Batch jobs ──────────────────────────────────────────────────────────────
pub static BATCH_JOB_RUNS: Lazy<IntCounterVec> =
    counter_vec!("batch_job_runs_total", "Batch job executions", &["job", "result"]);
pub static BATCH_JOB_DURATION: Lazy<HistogramVec> =
    histogram_vec!("batch_job_duration_seconds", "Batch job duration", &["job"]);
pub static BATCH_JOB_ROWS_WRITTEN: Lazy<IntCounterVec> =
    counter_vec!("batch_job_rows_written_total", "Rows written by a batch job", &["job"]);

// ── Cache ───────────────────────────────────────────────────────────────────
pub static CACHE_HITS: Lazy<IntCounterVec> = counter_vec!("cache_hits_total", "Cache hits", &["cache"]);
pub static CACHE_MISSES: Lazy<IntCounterVec> = counter_vec!("cache_misses_total", "Cache misses", &["cache"]);

// ── Database ────────────────────────────────────────────────────────────────
pub static DB_QUERY_DURATION: Lazy<HistogramVec> =
    histogram_vec!("db_query_duration_seconds", "Database query latency", &["query"]);
pub static DB_QUERY_ERRORS: Lazy<IntCounter> = counter!("db_query_errors_total", "DB query errors");

// ── System ──────────────────────────────────────────────────────────────────
pub static PROCESS_START_TIME: Lazy<IntGauge> = gauge!("process_start_time_seconds", "Process start time");

pub fn register_all(r: &Registry) -> prometheus::Result<()> {
    r.register(Box::new(HTTP_REQUESTS_TOTAL.clone()))?;
    r.register(Box::new(HTTP_REQUEST_DURATION.clone()))?;
    r.register(Box::new(HTTP_IN_FLIGHT.clone()))?;
    r.register(Box::new(RANKING_QUERIES_TOTAL.clone()))?;
    r.register(Box::new(RANKING_WEIGHT_UPDATES.clone()))?;
    r.register(Box::new(BATCH_JOB_RUNS.clone()))?;
    r.register(Box::new(BATCH_JOB_DURATION.clone()))?;
    r.register(Box::new(BATCH_JOB_ROWS_WRITTEN.clone()))?;
    r.register(Box::new(CACHE_HITS.clone()))?;
    r.register(Box::new(CACHE_MISSES.clone()))?;
    r.register(Box::new(DB_QUERY_DURATION.clone()))?;
    r.register(Box::new(DB_QUERY_ERRORS.clone()))?;
    r.register(Box::new(PROCESS_START_TIME.clone()))?;
    Ok(())
}

pub fn gather_metrics(r: &Registry) -> String {
    let encoder = TextEncoder::new();
    let families = r.gather();
    let mut buf = Vec::new();
    encoder.encode(&families, &mut buf).unwrap_or_default();
    String::from_utf8(buf).unwrap_or_default()
}

pub fn observe_http(method: &str, path: &str, status: u16, duration_secs: f64) {
    HTTP_REQUESTS_TOTAL.with_label_values(&[method, path, &status.to_string()]).inc();
    HTTP_REQUEST_DURATION.with_label_values(&[method, path]).observe(duration_secs);
}

pub fn observe_batch_job(job: &str, result: &str, duration_secs: f64, rows_written: u64) {
    BATCH_JOB_RUNS.with_label_values(&[job, result]).inc();
    BATCH_JOB_DURATION.with_label_values(&[job]).observe(duration_secs);
    BATCH_JOB_ROWS_WRITTEN.with_label_values(&[job]).inc_by(rows_written);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh_registry() -> Registry {
        let r = Registry::new_custom(Some("t".into()), None).unwrap();
        register_all(&r).unwrap();
        r
    }

    #[test]
    fn test_http_request_counter() {
        let r = fresh_registry();
        observe_http("GET", "/api/v1/rankings", 200, 0.01);
        let out = gather_metrics(&r);
        assert!(out.contains("http_requests_total"));
    }

    #[test]
    fn test_batch_job_observation() {
        let r = fresh_registry();
        observe_batch_job("hourly", "success", 1.2, 42);
        let out = gather_metrics(&r);
        assert!(out.contains("batch_job_runs_total"));
        assert!(out.contains("batch_job_rows_written_total"));
    }

    #[test]
    fn test_gather_returns_valid_prometheus_format() {
        let r = fresh_registry();
        RANKING_WEIGHT_UPDATES.inc();
        let out = gather_metrics(&r);
        assert!(out.contains("# HELP"));
        assert!(out.contains("# TYPE"));
        assert!(out.contains("ranking_weight_updates_total"));
    }
}
