pub mod daily;
pub mod hourly;
pub mod rollup;
pub mod weekly_monthly;

use serde::{Deserialize, Serialize};

/// Outcome of one job step execution. `read_count`/`write_count` must be
/// accurate regardless of chunking strategy (spec.md §9).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobReport {
    pub read_count: u64,
    pub write_count: u64,
}

impl JobReport {
    pub fn merge(self, other: JobReport) -> JobReport {
        JobReport {
            read_count: self.read_count + other.read_count,
            write_count: self.write_count + other.write_count,
        }
    }
}
