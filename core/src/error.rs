use thiserror::Error;

/// Domain-level errors shared by the `api` and `worker` binaries.
///
/// Internal invariant violations (out-of-range rank, negative score, decay
/// factor outside [0,1]) are programming bugs, not runtime-recoverable
/// conditions, and are represented by `Invariant` so callers fail fast
/// instead of trying to recover.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid period: {0}")]
    InvalidPeriod(String),

    #[error("invalid date format: {0}")]
    InvalidDateFormat(String),

    #[error("job already running: {0}")]
    JobAlreadyRunning(String),

    #[error("invariant violated: {0}")]
    Invariant(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("upstream service error: {0}")]
    Upstream(String),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
