//! The dashboard facade: every operation the HTTP layer exposes, composed
//! from the fact repository, the classification store and the campaign
//! directory.

use dashboard_core::{
    Campaign, CampaignId, CampaignStatus, CampaignStore, ClassificationOverride,
    ClassificationStore, CostOverride, CostUpdate, DisplayMode, EffectiveClassification,
    FactRepository, Granularity, HourRange, NewCostOverride, OverrideFields, Result, RuleMatch,
    RuleSet,
};
use std::sync::Arc;
use std::time::Instant;
use telemetry::metrics;
use tracing::{debug, info};

use crate::import::{self, ImportRecord, ImportSummary};
use crate::quality::{self, DataQualityReport};
use crate::ranking::{self, NetworkEntry, PerformerEntry};
use crate::resolver::{validate_author, validate_reason, OverrideResolver};
use crate::rollup::{self, CampaignRecord, Rollup, RollupOptions};
use crate::timeseries::{self, TimeSeriesPoint};

#[derive(Clone)]
pub struct Dashboard {
    facts: Arc<dyn FactRepository>,
    campaigns: Arc<dyn CampaignStore>,
    resolver: OverrideResolver,
    rules: Arc<RuleSet>,
}

impl Dashboard {
    pub fn new(
        facts: Arc<dyn FactRepository>,
        classifications: Arc<dyn ClassificationStore>,
        campaigns: Arc<dyn CampaignStore>,
        rules: RuleSet,
    ) -> Self {
        Self {
            facts,
            resolver: OverrideResolver::new(classifications, campaigns.clone()),
            campaigns,
            rules: Arc::new(rules),
        }
    }

    pub fn resolver(&self) -> &OverrideResolver {
        &self.resolver
    }

    /// Rollup tree for a display mode. A campaign appears iff it has facts
    /// in range, or `include_inactive` is set.
    pub async fn hierarchy(
        &self,
        mode: DisplayMode,
        range: HourRange,
        options: RollupOptions,
    ) -> Result<Rollup> {
        let start = Instant::now();
        let records = self.collect_records(&range, options.include_inactive).await?;
        let rollup = rollup::build(mode, range, records);

        let nodes = rollup.node_count();
        metrics().rollups_built.inc();
        metrics().rollup_nodes_emitted.inc_by(nodes as u64);
        metrics().rollup_latency_ms.observe_since(start);
        debug!(
            mode = %mode,
            range = %range,
            campaigns = rollup.campaign_count,
            nodes,
            "rollup built"
        );
        Ok(rollup)
    }

    pub async fn effective_classification(
        &self,
        campaign_id: CampaignId,
    ) -> Result<EffectiveClassification> {
        self.resolver.resolve_effective(campaign_id).await
    }

    pub async fn apply_override(
        &self,
        campaign_id: CampaignId,
        fields: OverrideFields,
        reason: Option<String>,
        author: &str,
    ) -> Result<EffectiveClassification> {
        self.resolver
            .apply_override(campaign_id, fields, reason, author)
            .await
    }

    pub async fn revert_override(&self, campaign_id: CampaignId, author: &str) -> Result<()> {
        self.resolver.revert_override(campaign_id, author).await
    }

    pub async fn override_history(
        &self,
        campaign_id: CampaignId,
        limit: usize,
    ) -> Result<Vec<ClassificationOverride>> {
        self.resolver.history(campaign_id, limit).await
    }

    pub async fn import_overrides(
        &self,
        records: Vec<ImportRecord>,
        reason: Option<String>,
        author: &str,
    ) -> Result<ImportSummary> {
        import::import_overrides(&self.resolver, self.campaigns.as_ref(), records, reason, author)
            .await
    }

    pub async fn top_performers(&self, range: HourRange, limit: usize) -> Result<Vec<PerformerEntry>> {
        let records = self.collect_records(&range, false).await?;
        Ok(ranking::top_performers(&records, limit))
    }

    pub async fn top_networks(&self, range: HourRange, limit: usize) -> Result<Vec<NetworkEntry>> {
        let records = self.collect_records(&range, false).await?;
        Ok(ranking::top_networks(&records, limit))
    }

    pub async fn time_series(
        &self,
        campaign_ids: Option<&[CampaignId]>,
        range: HourRange,
        granularity: Granularity,
    ) -> Result<Vec<TimeSeriesPoint>> {
        let periods = self
            .facts
            .sum_grouped_by_period(campaign_ids, &range, granularity)
            .await?;
        Ok(timeseries::build_series(periods))
    }

    pub async fn data_quality(&self, range: HourRange) -> Result<DataQualityReport> {
        let records = self.collect_records(&range, false).await?;
        Ok(quality::build_report(&records))
    }

    /// Run the mapping rules over the campaign name. Nothing is written.
    pub async fn suggest_classification(&self, campaign_id: CampaignId) -> Result<RuleMatch> {
        let campaign = self.campaigns.get_campaign(campaign_id).await?;
        Ok(self.rules.classify(&campaign.name))
    }

    /// Record a cost edit as the campaign's new active cost entry. The
    /// previous entry stays in the history, deactivated.
    pub async fn update_campaign_cost(
        &self,
        campaign_id: CampaignId,
        update: CostUpdate,
        reason: Option<String>,
        author: &str,
    ) -> Result<CostOverride> {
        let author = validate_author(author)?;
        let reason = validate_reason(reason)?;
        self.campaigns.get_campaign(campaign_id).await?;

        let stored = self
            .campaigns
            .replace_active_cost(NewCostOverride {
                campaign_id,
                update,
                reason,
                author,
            })
            .await?;
        info!(
            campaign_id,
            cost = stored.cost,
            cost_status = stored.cost_status.as_str(),
            start_date = ?stored.start_date,
            end_date = ?stored.end_date,
            author = %stored.author,
            "campaign cost updated"
        );
        Ok(stored)
    }

    /// Cost entries for the campaign, most recent first.
    pub async fn cost_history(&self, campaign_id: CampaignId, limit: usize) -> Result<Vec<CostOverride>> {
        self.campaigns.get_campaign(campaign_id).await?;
        if limit == 0 {
            return Ok(Vec::new());
        }
        self.campaigns.list_cost_history(campaign_id, limit).await
    }

    pub async fn set_campaign_status(
        &self,
        campaign_id: CampaignId,
        status: CampaignStatus,
    ) -> Result<Campaign> {
        let campaign = self.campaigns.update_status(campaign_id, status).await?;
        info!(campaign_id, status = %status, "campaign status updated");
        Ok(campaign)
    }

    /// Per-campaign sums for the range joined with directory entries,
    /// effective classifications and the cost attributed to the range, in
    /// campaign id order. One grouped fact query and one batch lookup per
    /// store.
    async fn collect_records(
        &self,
        range: &HourRange,
        include_inactive: bool,
    ) -> Result<Vec<CampaignRecord>> {
        let mut sums = self.facts.sum_by_campaign(None, range).await?;
        if include_inactive {
            for campaign in self.campaigns.list_campaigns().await? {
                sums.entry(campaign.id).or_default();
            }
        }
        if sums.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<CampaignId> = sums.keys().copied().collect();
        let mut directory = self.campaigns.get_campaigns(&ids).await?;
        let mut classifications = self.resolver.resolve_many(&ids).await?;
        let costs = self.campaigns.get_active_costs(&ids).await?;

        Ok(sums
            .into_iter()
            .map(|(id, counters)| {
                let cost = costs.get(&id);
                CampaignRecord {
                    campaign: directory.remove(&id).unwrap_or_else(|| orphan_campaign(id)),
                    classification: classifications.remove(&id),
                    counters,
                    cost: cost.map_or(0.0, |c| c.attributed_cost(range)),
                    cost_status: cost.map(|c| c.cost_status),
                }
            })
            .collect())
    }
}

/// Placeholder for a campaign that has facts but no directory entry.
fn orphan_campaign(id: CampaignId) -> Campaign {
    Campaign {
        is_serving: false,
        status: Some(CampaignStatus::Unknown),
        ..Campaign::new(id, format!("Campaign {}", id))
    }
}
