use once_cell::sync::Lazy;
use prometheus::{opts, Encoder, HistogramOpts, HistogramVec, IntCounterVec, Registry, TextEncoder};

const LATENCY_BUCKETS: [f64; 10] = [0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0];

pub static BATCH_JOB_RUNS: Lazy<IntCounterVec> =
    Lazy::new(|| IntCounterVec::new(opts!("batch_job_runs_total", "Batch job executions"), &["job", "result"]).unwrap());
pub static BATCH_JOB_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("batch_job_duration_seconds", "Batch job duration").buckets(LATENCY_BUCKETS.to_vec()),
        &["job"],
    )
    .unwrap()
});
pub static BATCH_JOB_ROWS_WRITTEN: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(opts!("batch_job_rows_written_total", "Rows written by a batch job"), &["job"]).unwrap()
});

pub fn register_all(r: &Registry) -> prometheus::Result<()> {
    r.register(Box::new(BATCH_JOB_RUNS.clone()))?;
    r.register(Box::new(BATCH_JOB_DURATION.clone()))?;
    r.register(Box::new(BATCH_JOB_ROWS_WRITTEN.clone()))?;
    Ok(())
}

pub fn gather_metrics(r: &Registry) -> String {
    let encoder = TextEncoder::new();
    let families = r.gather();
    let mut buf = Vec::new();
    encoder.encode(&families, &mut buf).unwrap_or_default();
    String::from_utf8(buf).unwrap_or_default()
}

pub fn observe_batch_job(job: &str, result: &str, duration_secs: f64, rows_written: u64) {
    BATCH_JOB_RUNS.with_label_values(&[job, result]).inc();
    BATCH_JOB_DURATION.with_label_values(&[job]).observe(duration_secs);
    BATCH_JOB_ROWS_WRITTEN.with_label_values(&[job]).inc_by(rows_written);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observes_job_outcome() {
        let r = Registry::new_custom(Some("t".into()), None).unwrap();
        register_all(&r).unwrap();
        observe_batch_job("hourly", "success", 2.0, 10);
        let out = gather_metrics(&r);
        assert!(out.contains("batch_job_runs_total"));
    }
}
