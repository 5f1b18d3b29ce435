use crate::error::{CoreError, CoreResult};
use chrono::{DateTime, Duration, Utc};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Hourly,
    Daily,
    Weekly,
    Monthly,
}

impl Period {
    /// Canonical lowercase label, used to build cross-process job-lock keys
    /// that must agree regardless of how the period was spelled on input.
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Hourly => "hourly",
            Period::Daily => "daily",
            Period::Weekly => "weekly",
            Period::Monthly => "monthly",
        }
    }

    /// Shifts an instant back by one bucket width for this period.
    pub fn subtract_one(&self, t: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Period::Hourly => t - Duration::hours(1),
            Period::Daily => t - Duration::days(1),
            Period::Weekly => t - Duration::days(7),
            Period::Monthly => t - Duration::days(30),
        }
    }

    /// Strict parse used by the materialized-table admin path: unknown
    /// input is rejected rather than silently defaulted.
    pub fn parse_strict(s: &str) -> CoreResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "hourly" => Ok(Period::Hourly),
            "daily" => Ok(Period::Daily),
            "weekly" => Ok(Period::Weekly),
            "monthly" => Ok(Period::Monthly),
            other => Err(CoreError::InvalidPeriod(other.to_string())),
        }
    }
}

/// Legacy read-API parse: case-insensitive, unknown defaults to `Hourly`.
impl FromStr for Period {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "daily" => Period::Daily,
            "weekly" => Period::Weekly,
            "monthly" => Period::Monthly,
            _ => Period::Hourly,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_parse_defaults_to_hourly() {
        assert_eq!("bogus".parse::<Period>().unwrap(), Period::Hourly);
        assert_eq!("DAILY".parse::<Period>().unwrap(), Period::Daily);
    }

    #[test]
    fn strict_parse_rejects_unknown() {
        assert!(Period::parse_strict("bogus").is_err());
        assert!(Period::parse_strict("Weekly").is_ok());
    }

    #[test]
    fn subtract_one_shifts_by_bucket_width() {
        let now: DateTime<Utc> = "2025-01-08T00:00:00Z".parse().unwrap();
        assert_eq!(Period::Hourly.subtract_one(now), now - Duration::hours(1));
        assert_eq!(Period::Weekly.subtract_one(now), now - Duration::days(7));
    }
}
