//! Datastore contracts consumed by the rollup engine.
//!
//! Implemented by the ClickHouse fact repository, the Postgres classification
//! store, and the in-memory store used in tests.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};

use crate::campaign::{Campaign, CampaignId, CampaignStatus};
use crate::classification::{ClassificationMapping, ClassificationOverride, NewOverride};
use crate::cost::{CostOverride, NewCostOverride};
use crate::error::Result;
use crate::metrics::RawCounters;
use crate::range::{Granularity, HourRange, PeriodCounters};

/// Read-only access to per-campaign, per-hour event counters.
#[async_trait]
pub trait FactRepository: Send + Sync {
    /// Sum counters per campaign. A campaign is present in the result iff at
    /// least one of its fact rows falls inside `range`.
    async fn sum_by_campaign(
        &self,
        campaign_ids: Option<&[CampaignId]>,
        range: &HourRange,
    ) -> Result<BTreeMap<CampaignId, RawCounters>>;

    /// Sum counters per period, ordered by period start.
    async fn sum_grouped_by_period(
        &self,
        campaign_ids: Option<&[CampaignId]>,
        range: &HourRange,
        granularity: Granularity,
    ) -> Result<Vec<PeriodCounters>>;
}

/// Base mappings and the override audit trail.
#[async_trait]
pub trait ClassificationStore: Send + Sync {
    /// Fails with `NotFound` when the campaign has no base mapping.
    async fn get_base(&self, campaign_id: CampaignId) -> Result<ClassificationMapping>;

    /// Batch lookup; campaigns without a mapping are absent from the result.
    async fn get_bases(
        &self,
        campaign_ids: &[CampaignId],
    ) -> Result<HashMap<CampaignId, ClassificationMapping>>;

    async fn get_active_override(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Option<ClassificationOverride>>;

    async fn get_active_overrides(
        &self,
        campaign_ids: &[CampaignId],
    ) -> Result<HashMap<CampaignId, ClassificationOverride>>;

    /// Deactivate any active override for the campaign and insert `row` as the
    /// new active one, as a single unit of work serialized per campaign.
    ///
    /// Fails with `Conflict` when the active override id no longer matches
    /// `row.expected_active`. The superseded row records `row.author` as the
    /// deactivating author.
    async fn replace_active_override(&self, row: NewOverride) -> Result<ClassificationOverride>;

    /// Deactivate the active override, returning how many rows changed.
    async fn deactivate(&self, campaign_id: CampaignId, deactivated_by: &str) -> Result<u64>;

    /// Override rows for the campaign, most recent first.
    async fn list_history(
        &self,
        campaign_id: CampaignId,
        limit: usize,
    ) -> Result<Vec<ClassificationOverride>>;
}

/// Campaign identity and locally editable fields.
#[async_trait]
pub trait CampaignStore: Send + Sync {
    /// Fails with `NotFound` when the campaign does not exist.
    async fn get_campaign(&self, campaign_id: CampaignId) -> Result<Campaign>;

    async fn get_campaigns(&self, campaign_ids: &[CampaignId]) -> Result<HashMap<CampaignId, Campaign>>;

    /// All campaigns, ordered by id.
    async fn list_campaigns(&self) -> Result<Vec<Campaign>>;

    /// Deactivate the campaign's active cost entry and insert `row` as the new
    /// active one, as a single unit of work serialized per campaign.
    async fn replace_active_cost(&self, row: NewCostOverride) -> Result<CostOverride>;

    /// Active cost entries; campaigns without one are absent from the result.
    async fn get_active_costs(
        &self,
        campaign_ids: &[CampaignId],
    ) -> Result<HashMap<CampaignId, CostOverride>>;

    /// Cost entries for the campaign, most recent first.
    async fn list_cost_history(&self, campaign_id: CampaignId, limit: usize) -> Result<Vec<CostOverride>>;

    async fn update_status(&self, campaign_id: CampaignId, status: CampaignStatus) -> Result<Campaign>;
}
