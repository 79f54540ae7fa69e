//! Database row types and their conversion into domain types.

use chrono::{DateTime, NaiveDate, Utc};
use dashboard_core::{
    Campaign, CampaignStatus, ClassificationMapping, ClassificationOverride, CostOverride,
    CostStatus, Error, OverrideFields, Result,
};
use sqlx::FromRow;

pub const CAMPAIGN_COLUMNS: &str = "id, name, is_serving, traffic_weight, status, updated_at";

pub const MAPPING_COLUMNS: &str =
    "campaign_id, network, domain, placement, targeting, special, confidence, updated_at";

pub const OVERRIDE_COLUMNS: &str = "id, campaign_id, network, domain, placement, targeting, special, \
     reason, author, created_at, active, deactivated_at, deactivated_by";

pub const COST_COLUMNS: &str = "id, campaign_id, cost, cost_status, start_date, end_date, reason, \
     author, created_at, active, deactivated_at, deactivated_by";

#[derive(Debug, Clone, FromRow)]
pub struct CampaignRow {
    pub id: i64,
    pub name: String,
    pub is_serving: bool,
    pub traffic_weight: i32,
    pub status: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<CampaignRow> for Campaign {
    type Error = Error;

    fn try_from(row: CampaignRow) -> Result<Self> {
        let status = row
            .status
            .as_deref()
            .map(str::parse::<CampaignStatus>)
            .transpose()
            .map_err(|e| Error::internal(format!("campaign {}: {}", row.id, e.message())))?;

        Ok(Campaign {
            id: row.id,
            name: row.name,
            is_serving: row.is_serving,
            traffic_weight: row.traffic_weight,
            status,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct MappingRow {
    pub campaign_id: i64,
    pub network: String,
    pub domain: String,
    pub placement: String,
    pub targeting: String,
    pub special: String,
    pub confidence: f64,
    pub updated_at: DateTime<Utc>,
}

impl From<MappingRow> for ClassificationMapping {
    fn from(row: MappingRow) -> Self {
        ClassificationMapping {
            campaign_id: row.campaign_id,
            network: row.network,
            domain: row.domain,
            placement: row.placement,
            targeting: row.targeting,
            special: row.special,
            confidence: row.confidence.clamp(0.0, 1.0),
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct OverrideRow {
    pub id: i64,
    pub campaign_id: i64,
    pub network: Option<String>,
    pub domain: Option<String>,
    pub placement: Option<String>,
    pub targeting: Option<String>,
    pub special: Option<String>,
    pub reason: Option<String>,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub active: bool,
    pub deactivated_at: Option<DateTime<Utc>>,
    pub deactivated_by: Option<String>,
}

impl From<OverrideRow> for ClassificationOverride {
    fn from(row: OverrideRow) -> Self {
        ClassificationOverride {
            id: row.id,
            campaign_id: row.campaign_id,
            fields: OverrideFields {
                network: row.network,
                domain: row.domain,
                placement: row.placement,
                targeting: row.targeting,
                special: row.special,
            },
            reason: row.reason,
            author: row.author,
            created_at: row.created_at,
            active: row.active,
            deactivated_at: row.deactivated_at,
            deactivated_by: row.deactivated_by,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct CostRow {
    pub id: i64,
    pub campaign_id: i64,
    pub cost: f64,
    pub cost_status: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub reason: Option<String>,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub active: bool,
    pub deactivated_at: Option<DateTime<Utc>>,
    pub deactivated_by: Option<String>,
}

impl TryFrom<CostRow> for CostOverride {
    type Error = Error;

    fn try_from(row: CostRow) -> Result<Self> {
        let cost_status = row
            .cost_status
            .parse::<CostStatus>()
            .map_err(|e| Error::internal(format!("cost entry {}: {}", row.id, e.message())))?;

        Ok(CostOverride {
            id: row.id,
            campaign_id: row.campaign_id,
            cost: row.cost,
            cost_status,
            start_date: row.start_date,
            end_date: row.end_date,
            reason: row.reason,
            author: row.author,
            created_at: row.created_at,
            active: row.active,
            deactivated_at: row.deactivated_at,
            deactivated_by: row.deactivated_by,
        })
    }
}
