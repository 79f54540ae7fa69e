//! Manual campaign cost entries and their attribution to hour ranges.
//!
//! Cost edits follow the override audit pattern: each edit deactivates the
//! previous entry and inserts a new active row, so the full edit trail stays
//! queryable.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::campaign::{CampaignId, CostStatus};
use crate::error::{Error, Result, ValidationErrorCode};
use crate::range::HourRange;

/// A validated cost edit, optionally scoped to a billing period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostUpdate {
    pub cost: f64,
    #[serde(default = "default_cost_status")]
    pub cost_status: CostStatus,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

fn default_cost_status() -> CostStatus {
    CostStatus::Confirmed
}

impl CostUpdate {
    /// Validates the cost is a finite, non-negative amount.
    pub fn new(cost: f64, cost_status: CostStatus) -> Result<Self> {
        if !cost.is_finite() || cost < 0.0 {
            return Err(Error::invalid(
                ValidationErrorCode::InvalidValue,
                format!("cost must be a finite non-negative amount, got {}", cost),
            ));
        }
        Ok(Self {
            cost,
            cost_status,
            start_date: None,
            end_date: None,
        })
    }

    /// Scope the cost to the days `start..=end`. Either end may be open.
    pub fn for_period(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<Self> {
        HourRange::from_dates(start, end)?;
        self.start_date = start;
        self.end_date = end;
        Ok(self)
    }
}

/// Cost row to be inserted as the campaign's single active cost entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCostOverride {
    pub campaign_id: CampaignId,
    pub update: CostUpdate,
    pub reason: Option<String>,
    pub author: String,
}

/// A stored cost entry. Rows are never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostOverride {
    pub id: i64,
    pub campaign_id: CampaignId,
    pub cost: f64,
    pub cost_status: CostStatus,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub reason: Option<String>,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub active: bool,
    #[serde(default)]
    pub deactivated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub deactivated_by: Option<String>,
}

impl CostOverride {
    /// Hours the entry applies to. Open dates leave the bound open.
    pub fn period(&self) -> HourRange {
        HourRange::from_dates(self.start_date, self.end_date).unwrap_or_default()
    }

    /// Share of the cost charged to `range`.
    ///
    /// Zero when the billing period and the range are disjoint. A fully dated
    /// period is prorated by the hours the range covers; an open-ended period
    /// has no length to prorate over, so any overlap charges the whole cost.
    pub fn attributed_cost(&self, range: &HourRange) -> f64 {
        let period = self.period();
        let Some(overlap) = period.intersect(range) else {
            return 0.0;
        };
        match (period.hour_count(), overlap.hour_count()) {
            (Some(total), Some(covered)) if total > 0 => self.cost * covered as f64 / total as f64,
            _ => self.cost,
        }
    }
}
