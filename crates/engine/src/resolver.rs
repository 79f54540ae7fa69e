//! Effective classification and the override audit trail.

use chrono::Utc;
use dashboard_core::{
    CampaignId, CampaignStore, ClassificationField, ClassificationMapping, ClassificationOverride,
    ClassificationStore, EffectiveClassification, Error, ErrorKind, NewOverride, OverrideFields,
    Result, ValidationErrorCode, MAX_FIELD_LEN,
};
use std::collections::HashMap;
use std::sync::Arc;
use telemetry::metrics;
use tracing::{info, warn};

pub const MAX_REASON_LEN: usize = 500;
pub const MAX_AUTHOR_LEN: usize = 128;

/// Layers active overrides over base mappings and maintains the
/// at-most-one-active-override invariant through the store.
#[derive(Clone)]
pub struct OverrideResolver {
    classifications: Arc<dyn ClassificationStore>,
    campaigns: Arc<dyn CampaignStore>,
}

impl OverrideResolver {
    pub fn new(
        classifications: Arc<dyn ClassificationStore>,
        campaigns: Arc<dyn CampaignStore>,
    ) -> Self {
        Self {
            classifications,
            campaigns,
        }
    }

    /// Effective classification for one campaign. Fails with `NotFound` when
    /// the campaign has no base mapping.
    pub async fn resolve_effective(&self, campaign_id: CampaignId) -> Result<EffectiveClassification> {
        let base = self.classifications.get_base(campaign_id).await?;
        let active = self.classifications.get_active_override(campaign_id).await?;
        Ok(EffectiveClassification::resolve(&base, active.as_ref()))
    }

    /// Batch resolution. Campaigns without a base mapping are absent, and
    /// callers treat them as unclassified.
    pub async fn resolve_many(
        &self,
        campaign_ids: &[CampaignId],
    ) -> Result<HashMap<CampaignId, EffectiveClassification>> {
        let bases = self.classifications.get_bases(campaign_ids).await?;
        let active = self.classifications.get_active_overrides(campaign_ids).await?;
        Ok(bases
            .iter()
            .map(|(id, base)| (*id, EffectiveClassification::resolve(base, active.get(id))))
            .collect())
    }

    /// Replace the campaign's active override with `fields` and return the
    /// resulting effective classification.
    ///
    /// The no-op check reads the active override before writing. The write
    /// carries that override's id, so an edit that raced in between fails
    /// with `Conflict` instead of being silently replaced. The result is
    /// built from the row this call stored, not from a second read.
    pub async fn apply_override(
        &self,
        campaign_id: CampaignId,
        fields: OverrideFields,
        reason: Option<String>,
        author: &str,
    ) -> Result<EffectiveClassification> {
        let author = validate_author(author)?;
        let reason = validate_reason(reason)?;
        let fields = fields.normalized();
        validate_field_lengths(&fields)?;

        match self.campaigns.get_campaign(campaign_id).await {
            Ok(_) => {}
            Err(e) if e.is_not_found() => {
                return Err(Error::invalid(
                    ValidationErrorCode::UnknownCampaign,
                    format!("campaign {} does not exist", campaign_id),
                ));
            }
            Err(e) => return Err(e),
        }

        let base = self.classifications.get_base(campaign_id).await?;
        let active = self.classifications.get_active_override(campaign_id).await?;
        let current = EffectiveClassification::resolve(&base, active.as_ref());

        if is_noop(&base, &current, &fields) {
            metrics().noop_overrides_rejected.inc();
            return Err(Error::invalid(
                ValidationErrorCode::NoOpOverride,
                format!(
                    "override for campaign {} does not change its classification",
                    campaign_id
                ),
            ));
        }

        let set_fields = fields.set_fields();
        let stored = self
            .classifications
            .replace_active_override(NewOverride {
                campaign_id,
                fields,
                reason,
                author: author.clone(),
                expected_active: active.as_ref().map(|o| o.id),
            })
            .await
            .inspect_err(|e| {
                if e.kind() == ErrorKind::Conflict {
                    metrics().override_conflicts.inc();
                    warn!(campaign_id, author = %author, "concurrent override rejected");
                }
            })?;

        metrics().overrides_applied.inc();
        info!(
            campaign_id,
            author = %author,
            override_id = stored.id,
            fields = ?set_fields,
            "classification override applied"
        );

        Ok(EffectiveClassification::resolve(&base, Some(&stored)))
    }

    /// Deactivate the active override, if any. Idempotent.
    pub async fn revert_override(&self, campaign_id: CampaignId, author: &str) -> Result<()> {
        let author = validate_author(author)?;
        self.campaigns.get_campaign(campaign_id).await?;

        let deactivated = self
            .classifications
            .deactivate(campaign_id, &author)
            .await
            .inspect_err(|e| {
                if e.kind() == ErrorKind::Conflict {
                    metrics().override_conflicts.inc();
                }
            })?;

        if deactivated > 0 {
            metrics().overrides_reverted.inc();
            info!(campaign_id, author = %author, deactivated, "classification override reverted");
        }
        Ok(())
    }

    /// Override rows for the campaign, most recent first.
    pub async fn history(
        &self,
        campaign_id: CampaignId,
        limit: usize,
    ) -> Result<Vec<ClassificationOverride>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        self.classifications.list_history(campaign_id, limit).await
    }
}

/// An edit is a no-op when it sets nothing, or when every field it sets
/// already holds that value and applying it leaves the classification as is.
fn is_noop(
    base: &ClassificationMapping,
    current: &EffectiveClassification,
    fields: &OverrideFields,
) -> bool {
    if fields.is_empty() {
        return true;
    }
    let candidate = ClassificationOverride {
        id: 0,
        campaign_id: base.campaign_id,
        fields: fields.clone(),
        reason: None,
        author: String::new(),
        created_at: Utc::now(),
        active: true,
        deactivated_at: None,
        deactivated_by: None,
    };
    let next = EffectiveClassification::resolve(base, Some(&candidate));
    ClassificationField::ALL
        .iter()
        .all(|f| next.get(*f) == current.get(*f))
}

pub(crate) fn validate_author(author: &str) -> Result<String> {
    let author = author.trim();
    if author.is_empty() || author.chars().count() > MAX_AUTHOR_LEN {
        return Err(Error::invalid(
            ValidationErrorCode::InvalidValue,
            format!("author must be 1 to {} characters", MAX_AUTHOR_LEN),
        ));
    }
    Ok(author.to_string())
}

pub(crate) fn validate_reason(reason: Option<String>) -> Result<Option<String>> {
    let reason = reason
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty());
    if reason
        .as_ref()
        .is_some_and(|r| r.chars().count() > MAX_REASON_LEN)
    {
        return Err(Error::invalid(
            ValidationErrorCode::InvalidValue,
            format!("reason must be at most {} characters", MAX_REASON_LEN),
        ));
    }
    Ok(reason)
}

fn validate_field_lengths(fields: &OverrideFields) -> Result<()> {
    for field in fields.set_fields() {
        let len = fields.get(field).map_or(0, |v| v.chars().count());
        if len > MAX_FIELD_LEN {
            return Err(Error::invalid(
                ValidationErrorCode::InvalidValue,
                format!("{} must be at most {} characters", field, MAX_FIELD_LEN),
            ));
        }
    }
    Ok(())
}
