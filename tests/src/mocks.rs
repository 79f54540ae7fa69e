//! Failure-injecting wrappers around the in-memory store.

use async_trait::async_trait;
use dashboard_core::{
    CampaignId, ClassificationMapping, ClassificationOverride, ClassificationStore, ConflictCode,
    Error, FactRepository, Granularity, HourRange, NewOverride, PeriodCounters, RawCounters,
    Result,
};
use parking_lot::Mutex;
use rollup_engine::memory::InMemoryStore;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Fact repository that can simulate a datastore outage.
#[derive(Clone)]
pub struct FlakyFacts {
    inner: Arc<InMemoryStore>,
    should_fail: Arc<Mutex<bool>>,
}

impl FlakyFacts {
    pub fn new(inner: Arc<InMemoryStore>) -> Self {
        Self {
            inner,
            should_fail: Arc::new(Mutex::new(false)),
        }
    }

    pub fn set_should_fail(&self, fail: bool) {
        *self.should_fail.lock() = fail;
    }

    fn check(&self) -> Result<()> {
        if *self.should_fail.lock() {
            return Err(Error::unavailable("mock fact store unreachable"));
        }
        Ok(())
    }
}

#[async_trait]
impl FactRepository for FlakyFacts {
    async fn sum_by_campaign(
        &self,
        campaign_ids: Option<&[CampaignId]>,
        range: &HourRange,
    ) -> Result<BTreeMap<CampaignId, RawCounters>> {
        self.check()?;
        self.inner.sum_by_campaign(campaign_ids, range).await
    }

    async fn sum_grouped_by_period(
        &self,
        campaign_ids: Option<&[CampaignId]>,
        range: &HourRange,
        granularity: Granularity,
    ) -> Result<Vec<PeriodCounters>> {
        self.check()?;
        self.inner
            .sum_grouped_by_period(campaign_ids, range, granularity)
            .await
    }
}

/// Classification store whose override writes can be made to lose a race.
#[derive(Clone)]
pub struct ContendedClassifications {
    inner: Arc<InMemoryStore>,
    contended: Arc<Mutex<bool>>,
}

impl ContendedClassifications {
    pub fn new(inner: Arc<InMemoryStore>) -> Self {
        Self {
            inner,
            contended: Arc::new(Mutex::new(false)),
        }
    }

    pub fn set_contended(&self, contended: bool) {
        *self.contended.lock() = contended;
    }

    fn check(&self, campaign_id: CampaignId) -> Result<()> {
        if *self.contended.lock() {
            return Err(Error::conflict(
                ConflictCode::ConcurrentOverride,
                format!("override for campaign {} changed concurrently", campaign_id),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ClassificationStore for ContendedClassifications {
    async fn get_base(&self, campaign_id: CampaignId) -> Result<ClassificationMapping> {
        self.inner.get_base(campaign_id).await
    }

    async fn get_bases(
        &self,
        campaign_ids: &[CampaignId],
    ) -> Result<HashMap<CampaignId, ClassificationMapping>> {
        self.inner.get_bases(campaign_ids).await
    }

    async fn get_active_override(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Option<ClassificationOverride>> {
        self.inner.get_active_override(campaign_id).await
    }

    async fn get_active_overrides(
        &self,
        campaign_ids: &[CampaignId],
    ) -> Result<HashMap<CampaignId, ClassificationOverride>> {
        self.inner.get_active_overrides(campaign_ids).await
    }

    async fn replace_active_override(&self, row: NewOverride) -> Result<ClassificationOverride> {
        self.check(row.campaign_id)?;
        self.inner.replace_active_override(row).await
    }

    async fn deactivate(&self, campaign_id: CampaignId, deactivated_by: &str) -> Result<u64> {
        self.check(campaign_id)?;
        self.inner.deactivate(campaign_id, deactivated_by).await
    }

    async fn list_history(
        &self,
        campaign_id: CampaignId,
        limit: usize,
    ) -> Result<Vec<ClassificationOverride>> {
        self.inner.list_history(campaign_id, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_flaky_facts_failure_mode() {
        let facts = FlakyFacts::new(Arc::new(InMemoryStore::new()));
        assert!(facts.sum_by_campaign(None, &HourRange::all()).await.is_ok());

        facts.set_should_fail(true);
        let err = facts
            .sum_by_campaign(None, &HourRange::all())
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), Some("DB_001"));
    }

    #[tokio::test]
    async fn test_contended_store_rejects_writes_only() {
        let store = Arc::new(InMemoryStore::new());
        let contended = ContendedClassifications::new(store);
        contended.set_contended(true);

        assert!(contended.get_active_override(1).await.unwrap().is_none());
        let err = contended.deactivate(1, "alice").await.unwrap_err();
        assert_eq!(err.error_code(), Some("CONFLICT_001"));
    }
}
