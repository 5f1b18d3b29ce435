pub mod error;
pub mod job_registry;
pub mod jobs;
pub mod models;
pub mod period;
pub mod redis_key;
pub mod repo;
pub mod score;
pub mod score_calculator;
pub mod staging;

pub use error::{CoreError, CoreResult};
pub use period::Period;
pub use score::Score;
