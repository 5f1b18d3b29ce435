use crate::period::Period;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Asia::Seoul;

const STAGING_SUFFIX: &str = ":staging";

/// Deterministic Redis sorted-set key for an hourly bucket, KST.
pub fn hourly_key(bucket: DateTime<Utc>) -> String {
    let kst = bucket.with_timezone(&Seoul);
    format!("ranking:products:hourly:{}", kst.format("%Y%m%d%H"))
}

/// Deterministic Redis sorted-set key for a daily bucket, KST.
pub fn daily_key(bucket: NaiveDate) -> String {
    format!("ranking:products:daily:{}", bucket.format("%Y%m%d"))
}

pub fn staging(key: &str) -> String {
    format!("{key}{STAGING_SUFFIX}")
}

/// `now()` in KST, used by the read path for HOURLY/DAILY live-key lookups.
pub fn current_bucket_key(period: Period, now: DateTime<Utc>) -> Option<String> {
    match period {
        Period::Hourly => Some(hourly_key(now)),
        Period::Daily => Some(daily_key(now.with_timezone(&Seoul).date_naive())),
        Period::Weekly | Period::Monthly => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn hourly_key_is_kst_truncated() {
        // 2025-01-01T15:30:00Z == 2025-01-02T00:30:00+09:00
        let t = Utc.with_ymd_and_hms(2025, 1, 1, 15, 30, 0).unwrap();
        assert_eq!(hourly_key(t), "ranking:products:hourly:2025010200");
    }

    #[test]
    fn staging_appends_suffix() {
        assert_eq!(staging("ranking:products:hourly:2025010200"),
            "ranking:products:hourly:2025010200:staging");
    }

    #[test]
    fn daily_key_format() {
        let d = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        assert_eq!(daily_key(d), "ranking:products:daily:20250102");
    }
}
