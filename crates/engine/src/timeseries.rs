//! Period time series with growth against the previous point.

use chrono::{DateTime, Utc};
use dashboard_core::{derive_rates, round2, safe_div, DerivedMetrics, PeriodCounters, RawCounters};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeriesPoint {
    /// Period start, unix seconds UTC
    pub period_start: i64,
    pub period_start_utc: Option<DateTime<Utc>>,
    pub raw: RawCounters,
    pub rates: DerivedMetrics,
    /// Session change vs the previous point, in percent
    pub session_growth_pct: f64,
}

/// Annotate ordered period sums with rates and session growth. Growth is 0
/// for the first point and whenever the previous point had no sessions.
pub fn build_series(periods: Vec<PeriodCounters>) -> Vec<TimeSeriesPoint> {
    let mut previous: Option<u64> = None;
    periods
        .into_iter()
        .map(|period| {
            let sessions = period.counters.sessions;
            let growth = previous.map_or(0.0, |prev| {
                safe_div(sessions as f64 - prev as f64, prev as f64) * 100.0
            });
            previous = Some(sessions);

            TimeSeriesPoint {
                period_start: period.period_start,
                period_start_utc: DateTime::from_timestamp(period.period_start, 0),
                raw: period.counters,
                rates: derive_rates(&period.counters).rounded(),
                session_growth_pct: round2(growth),
            }
        })
        .collect()
}
