//! Campaign identity and locally editable display fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result, ValidationErrorCode};

/// Campaign identifier assigned by the upstream ad platform.
pub type CampaignId = i64;

/// Manually set campaign status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Live,
    Paused,
    Unknown,
}

impl CampaignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Paused => "paused",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CampaignStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "live" => Ok(Self::Live),
            "paused" => Ok(Self::Paused),
            "unknown" => Ok(Self::Unknown),
            other => Err(Error::invalid(
                ValidationErrorCode::InvalidValue,
                format!("unknown campaign status '{}'", other),
            )),
        }
    }
}

/// Provenance of a campaign's cost figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostStatus {
    #[default]
    Estimated,
    Confirmed,
    ApiSourced,
}

impl CostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Estimated => "estimated",
            Self::Confirmed => "confirmed",
            Self::ApiSourced => "api_sourced",
        }
    }
}

impl FromStr for CostStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "estimated" => Ok(Self::Estimated),
            "confirmed" => Ok(Self::Confirmed),
            "api_sourced" => Ok(Self::ApiSourced),
            other => Err(Error::invalid(
                ValidationErrorCode::InvalidValue,
                format!("unknown cost status '{}'", other),
            )),
        }
    }
}

/// A campaign as known to the campaign directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    pub name: String,
    pub is_serving: bool,
    pub traffic_weight: i32,
    /// Explicitly set status; `None` means derive from `is_serving`
    pub status: Option<CampaignStatus>,
    pub updated_at: DateTime<Utc>,
}

impl Campaign {
    /// Creates a serving campaign with no status set.
    pub fn new(id: CampaignId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            is_serving: true,
            traffic_weight: 0,
            status: None,
            updated_at: Utc::now(),
        }
    }

    /// Status in force: the manual value, or one derived from the serving flag.
    pub fn effective_status(&self) -> CampaignStatus {
        match self.status {
            Some(status) => status,
            None if self.is_serving => CampaignStatus::Live,
            None => CampaignStatus::Paused,
        }
    }
}
