//! In-process implementation of every datastore contract.
//!
//! Used by tests and local demos. Override replacement happens under one
//! write lock, so it has the same at-most-one-active guarantee as the
//! Postgres store.

use async_trait::async_trait;
use chrono::Utc;
use dashboard_core::{
    Campaign, CampaignId, CampaignStatus, CampaignStore, ClassificationMapping,
    ClassificationOverride, ClassificationStore, CostOverride, Error, FactRepository, Granularity,
    HourRange, NewCostOverride, NewOverride, PeriodCounters, RawCounters, Result,
};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Default)]
struct Inner {
    campaigns: BTreeMap<CampaignId, Campaign>,
    mappings: HashMap<CampaignId, ClassificationMapping>,
    overrides: Vec<ClassificationOverride>,
    next_override_id: i64,
    costs: Vec<CostOverride>,
    next_cost_id: i64,
    /// Keyed by (campaign id, unix hour); a later insert replaces the hour
    facts: BTreeMap<(CampaignId, i64), RawCounters>,
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_campaign(&self, campaign: Campaign) {
        self.inner.write().campaigns.insert(campaign.id, campaign);
    }

    pub fn insert_mapping(&self, mapping: ClassificationMapping) {
        self.inner.write().mappings.insert(mapping.campaign_id, mapping);
    }

    /// Insert or replace the counters for one campaign hour.
    pub fn insert_fact(&self, campaign_id: CampaignId, unix_hour: i64, counters: RawCounters) {
        self.inner
            .write()
            .facts
            .insert((campaign_id, unix_hour), counters);
    }

    /// Number of active override rows for a campaign.
    pub fn active_override_count(&self, campaign_id: CampaignId) -> usize {
        self.inner
            .read()
            .overrides
            .iter()
            .filter(|o| o.campaign_id == campaign_id && o.active)
            .count()
    }

    pub fn override_count(&self, campaign_id: CampaignId) -> usize {
        self.inner
            .read()
            .overrides
            .iter()
            .filter(|o| o.campaign_id == campaign_id)
            .count()
    }

    /// Number of active cost entries for a campaign.
    pub fn active_cost_count(&self, campaign_id: CampaignId) -> usize {
        self.inner
            .read()
            .costs
            .iter()
            .filter(|c| c.campaign_id == campaign_id && c.active)
            .count()
    }

    fn deactivate_overrides(inner: &mut Inner, campaign_id: CampaignId, by: &str) -> u64 {
        let now = Utc::now();
        let mut changed = 0;
        for existing in inner
            .overrides
            .iter_mut()
            .filter(|o| o.campaign_id == campaign_id && o.active)
        {
            existing.active = false;
            existing.deactivated_at = Some(now);
            existing.deactivated_by = Some(by.to_string());
            changed += 1;
        }
        changed
    }

    fn matching_facts<'a>(
        inner: &'a Inner,
        campaign_ids: Option<&'a [CampaignId]>,
        range: &'a HourRange,
    ) -> impl Iterator<Item = (CampaignId, i64, &'a RawCounters)> + 'a {
        inner
            .facts
            .iter()
            .filter(move |((id, hour), _)| {
                campaign_ids.map_or(true, |ids| ids.contains(id)) && range.contains(*hour)
            })
            .map(|((id, hour), counters)| (*id, *hour, counters))
    }
}

#[async_trait]
impl FactRepository for InMemoryStore {
    async fn sum_by_campaign(
        &self,
        campaign_ids: Option<&[CampaignId]>,
        range: &HourRange,
    ) -> Result<BTreeMap<CampaignId, RawCounters>> {
        let inner = self.inner.read();
        let mut sums: BTreeMap<CampaignId, RawCounters> = BTreeMap::new();
        for (id, _, counters) in Self::matching_facts(&inner, campaign_ids, range) {
            *sums.entry(id).or_default() += *counters;
        }
        Ok(sums)
    }

    async fn sum_grouped_by_period(
        &self,
        campaign_ids: Option<&[CampaignId]>,
        range: &HourRange,
        granularity: Granularity,
    ) -> Result<Vec<PeriodCounters>> {
        let inner = self.inner.read();
        let mut periods: BTreeMap<i64, RawCounters> = BTreeMap::new();
        for (_, hour, counters) in Self::matching_facts(&inner, campaign_ids, range) {
            *periods.entry(granularity.period_start(hour)).or_default() += *counters;
        }
        Ok(periods
            .into_iter()
            .map(|(period_start, counters)| PeriodCounters {
                period_start,
                counters,
            })
            .collect())
    }
}

#[async_trait]
impl ClassificationStore for InMemoryStore {
    async fn get_base(&self, campaign_id: CampaignId) -> Result<ClassificationMapping> {
        self.inner
            .read()
            .mappings
            .get(&campaign_id)
            .cloned()
            .ok_or_else(|| Error::classification_not_found(campaign_id))
    }

    async fn get_bases(
        &self,
        campaign_ids: &[CampaignId],
    ) -> Result<HashMap<CampaignId, ClassificationMapping>> {
        let inner = self.inner.read();
        Ok(campaign_ids
            .iter()
            .filter_map(|id| inner.mappings.get(id).map(|m| (*id, m.clone())))
            .collect())
    }

    async fn get_active_override(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Option<ClassificationOverride>> {
        Ok(self
            .inner
            .read()
            .overrides
            .iter()
            .find(|o| o.campaign_id == campaign_id && o.active)
            .cloned())
    }

    async fn get_active_overrides(
        &self,
        campaign_ids: &[CampaignId],
    ) -> Result<HashMap<CampaignId, ClassificationOverride>> {
        Ok(self
            .inner
            .read()
            .overrides
            .iter()
            .filter(|o| o.active && campaign_ids.contains(&o.campaign_id))
            .map(|o| (o.campaign_id, o.clone()))
            .collect())
    }

    async fn replace_active_override(&self, row: NewOverride) -> Result<ClassificationOverride> {
        let mut inner = self.inner.write();
        let current = inner
            .overrides
            .iter()
            .find(|o| o.campaign_id == row.campaign_id && o.active)
            .map(|o| o.id);
        if current != row.expected_active {
            return Err(Error::stale_override(row.campaign_id));
        }
        Self::deactivate_overrides(&mut inner, row.campaign_id, &row.author);

        inner.next_override_id += 1;
        let stored = ClassificationOverride {
            id: inner.next_override_id,
            campaign_id: row.campaign_id,
            fields: row.fields,
            reason: row.reason,
            author: row.author,
            created_at: Utc::now(),
            active: true,
            deactivated_at: None,
            deactivated_by: None,
        };
        inner.overrides.push(stored.clone());
        Ok(stored)
    }

    async fn deactivate(&self, campaign_id: CampaignId, deactivated_by: &str) -> Result<u64> {
        let mut inner = self.inner.write();
        Ok(Self::deactivate_overrides(&mut inner, campaign_id, deactivated_by))
    }

    async fn list_history(
        &self,
        campaign_id: CampaignId,
        limit: usize,
    ) -> Result<Vec<ClassificationOverride>> {
        let inner = self.inner.read();
        let mut rows: Vec<ClassificationOverride> = inner
            .overrides
            .iter()
            .filter(|o| o.campaign_id == campaign_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        rows.truncate(limit);
        Ok(rows)
    }
}

#[async_trait]
impl CampaignStore for InMemoryStore {
    async fn get_campaign(&self, campaign_id: CampaignId) -> Result<Campaign> {
        self.inner
            .read()
            .campaigns
            .get(&campaign_id)
            .cloned()
            .ok_or_else(|| Error::campaign_not_found(campaign_id))
    }

    async fn get_campaigns(&self, campaign_ids: &[CampaignId]) -> Result<HashMap<CampaignId, Campaign>> {
        let inner = self.inner.read();
        Ok(campaign_ids
            .iter()
            .filter_map(|id| inner.campaigns.get(id).map(|c| (*id, c.clone())))
            .collect())
    }

    async fn list_campaigns(&self) -> Result<Vec<Campaign>> {
        Ok(self.inner.read().campaigns.values().cloned().collect())
    }

    async fn replace_active_cost(&self, row: NewCostOverride) -> Result<CostOverride> {
        let mut inner = self.inner.write();
        if !inner.campaigns.contains_key(&row.campaign_id) {
            return Err(Error::campaign_not_found(row.campaign_id));
        }
        let now = Utc::now();
        for existing in inner
            .costs
            .iter_mut()
            .filter(|c| c.campaign_id == row.campaign_id && c.active)
        {
            existing.active = false;
            existing.deactivated_at = Some(now);
            existing.deactivated_by = Some(row.author.clone());
        }

        inner.next_cost_id += 1;
        let stored = CostOverride {
            id: inner.next_cost_id,
            campaign_id: row.campaign_id,
            cost: row.update.cost,
            cost_status: row.update.cost_status,
            start_date: row.update.start_date,
            end_date: row.update.end_date,
            reason: row.reason,
            author: row.author,
            created_at: now,
            active: true,
            deactivated_at: None,
            deactivated_by: None,
        };
        inner.costs.push(stored.clone());
        Ok(stored)
    }

    async fn get_active_costs(
        &self,
        campaign_ids: &[CampaignId],
    ) -> Result<HashMap<CampaignId, CostOverride>> {
        Ok(self
            .inner
            .read()
            .costs
            .iter()
            .filter(|c| c.active && campaign_ids.contains(&c.campaign_id))
            .map(|c| (c.campaign_id, c.clone()))
            .collect())
    }

    async fn list_cost_history(&self, campaign_id: CampaignId, limit: usize) -> Result<Vec<CostOverride>> {
        let inner = self.inner.read();
        let mut rows: Vec<CostOverride> = inner
            .costs
            .iter()
            .filter(|c| c.campaign_id == campaign_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        rows.truncate(limit);
        Ok(rows)
    }

    async fn update_status(&self, campaign_id: CampaignId, status: CampaignStatus) -> Result<Campaign> {
        let mut inner = self.inner.write();
        let campaign = inner
            .campaigns
            .get_mut(&campaign_id)
            .ok_or_else(|| Error::campaign_not_found(campaign_id))?;
        campaign.status = Some(status);
        campaign.updated_at = Utc::now();
        Ok(campaign.clone())
    }
}
