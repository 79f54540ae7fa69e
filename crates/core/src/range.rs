//! Unix-hour ranges and time-series granularity.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result, ValidationErrorCode};
use crate::metrics::RawCounters;

pub const SECONDS_PER_HOUR: i64 = 3600;

/// Unix hour bucket containing the given instant.
pub fn unix_hour(ts: DateTime<Utc>) -> i64 {
    ts.timestamp().div_euclid(SECONDS_PER_HOUR)
}

/// Inclusive range of unix-hour buckets. Either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HourRange {
    pub from_hour: Option<i64>,
    pub to_hour: Option<i64>,
}

impl HourRange {
    /// Range covering every hour.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn new(from_hour: Option<i64>, to_hour: Option<i64>) -> Result<Self> {
        if let (Some(from), Some(to)) = (from_hour, to_hour) {
            if from > to {
                return Err(Error::invalid(
                    ValidationErrorCode::InvalidRange,
                    format!("range start hour {} is after end hour {}", from, to),
                ));
            }
        }
        Ok(Self { from_hour, to_hour })
    }

    pub fn hours(from_hour: i64, to_hour: i64) -> Result<Self> {
        Self::new(Some(from_hour), Some(to_hour))
    }

    /// Build from UTC calendar dates. The end date covers its whole day.
    pub fn from_dates(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<Self> {
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(Error::invalid(
                    ValidationErrorCode::InvalidRange,
                    format!("start date {} is after end date {}", s, e),
                ));
            }
        }
        let from_hour = start.map(date_start_hour);
        let to_hour = end.map(|d| date_start_hour(d) + 23);
        Self::new(from_hour, to_hour)
    }

    pub fn is_unbounded(&self) -> bool {
        self.from_hour.is_none() && self.to_hour.is_none()
    }

    pub fn contains(&self, hour: i64) -> bool {
        self.from_hour.map_or(true, |from| hour >= from) && self.to_hour.map_or(true, |to| hour <= to)
    }

    /// Hours shared by both ranges, or `None` when they are disjoint.
    pub fn intersect(&self, other: &HourRange) -> Option<HourRange> {
        let from_hour = match (self.from_hour, other.from_hour) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        let to_hour = match (self.to_hour, other.to_hour) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        match (from_hour, to_hour) {
            (Some(from), Some(to)) if from > to => None,
            _ => Some(HourRange { from_hour, to_hour }),
        }
    }

    /// Number of hour buckets covered. `None` if either bound is open.
    pub fn hour_count(&self) -> Option<i64> {
        Some(self.to_hour? - self.from_hour? + 1)
    }
}

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        Error::invalid(
            ValidationErrorCode::InvalidRange,
            format!("'{}' is not a YYYY-MM-DD date", raw),
        )
    })
}

fn date_start_hour(date: NaiveDate) -> i64 {
    let midnight = date.and_hms_opt(0, 0, 0).unwrap_or_default();
    Utc.from_utc_datetime(&midnight).timestamp() / SECONDS_PER_HOUR
}

impl fmt::Display for HourRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bound = |b: Option<i64>| b.map_or_else(|| "*".to_string(), |h| h.to_string());
        write!(f, "[{}, {}]", bound(self.from_hour), bound(self.to_hour))
    }
}

/// Time-series bucket size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Hour,
    #[default]
    Day,
    Week,
    Month,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }

    /// Start of the period containing `hour`, as unix seconds (UTC).
    /// Weeks start on Monday.
    pub fn period_start(&self, hour: i64) -> i64 {
        let secs = hour * SECONDS_PER_HOUR;
        let Some(ts) = Utc.timestamp_opt(secs, 0).single() else {
            return secs;
        };
        let day = ts.date_naive();
        let start = match self {
            Self::Hour => return secs,
            Self::Day => day,
            Self::Week => day - Duration::days(day.weekday().num_days_from_monday() as i64),
            Self::Month => day.with_day(1).unwrap_or(day),
        };
        date_start_hour(start) * SECONDS_PER_HOUR
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hour" => Ok(Self::Hour),
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            other => Err(Error::invalid(
                ValidationErrorCode::UnknownGranularity,
                format!("unknown granularity '{}'", other),
            )),
        }
    }
}

/// Counters summed over one time-series period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodCounters {
    /// Period start, unix seconds UTC
    pub period_start: i64,
    pub counters: RawCounters,
}
