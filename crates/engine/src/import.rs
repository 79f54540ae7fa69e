//! Bulk override import.
//!
//! Records name their campaign by id or by name. Names are matched against
//! the campaign directory ignoring case and surrounding whitespace.

use dashboard_core::{
    CampaignId, CampaignStore, ClassificationField, Error, NotFoundCode, OverrideFields, Result,
    ValidationErrorCode,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, warn};

use crate::resolver::OverrideResolver;

/// Value stored when an import row spells a field as "none".
pub const UNKNOWN_VALUE: &str = "Unknown";

/// One row of a bulk import: a campaign and the fields to override.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportRecord {
    /// Takes precedence over `campaign_name` when both are given
    #[serde(default)]
    pub campaign_id: Option<CampaignId>,
    #[serde(default)]
    pub campaign_name: Option<String>,
    #[serde(flatten)]
    pub fields: OverrideFields,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportFailure {
    pub campaign_id: Option<CampaignId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub campaign_name: Option<String>,
    pub code: Option<&'static str>,
    pub error: String,
}

impl ImportFailure {
    fn new(record: &ImportRecord, campaign_id: Option<CampaignId>, e: &Error) -> Self {
        Self {
            campaign_id,
            campaign_name: record.campaign_name.clone(),
            code: e.error_code(),
            error: e.message(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportSummary {
    pub imported: usize,
    /// Records that would not change the classification
    pub skipped: usize,
    pub failed: Vec<ImportFailure>,
}

/// Campaign ids keyed by normalized name.
struct NameIndex(HashMap<String, Vec<CampaignId>>);

impl NameIndex {
    async fn load(campaigns: &dyn CampaignStore) -> Result<Self> {
        let mut index: HashMap<String, Vec<CampaignId>> = HashMap::new();
        for campaign in campaigns.list_campaigns().await? {
            index
                .entry(normalize_name(&campaign.name))
                .or_default()
                .push(campaign.id);
        }
        Ok(Self(index))
    }

    fn lookup(&self, name: &str) -> Result<CampaignId> {
        match self.0.get(&normalize_name(name)).map(Vec::as_slice) {
            Some([id]) => Ok(*id),
            Some(ids) if ids.len() > 1 => Err(Error::invalid(
                ValidationErrorCode::InvalidValue,
                format!("campaign name '{}' matches {} campaigns", name.trim(), ids.len()),
            )),
            _ => Err(Error::not_found(
                NotFoundCode::Campaign,
                format!("no campaign named '{}'", name.trim()),
            )),
        }
    }
}

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Spreadsheet exports write "none" for an empty cell; it is stored as
/// [`UNKNOWN_VALUE`]. Blank values stay unset.
fn clean_fields(fields: OverrideFields) -> OverrideFields {
    let mut out = OverrideFields::default();
    for field in ClassificationField::ALL {
        let value = fields.get(field).map(|v| {
            if v.trim().eq_ignore_ascii_case("none") {
                UNKNOWN_VALUE.to_string()
            } else {
                v.to_string()
            }
        });
        out.set(field, value);
    }
    out
}

/// Apply each record as an independent override. One record failing does
/// not stop the rest.
pub async fn import_overrides(
    resolver: &OverrideResolver,
    campaigns: &dyn CampaignStore,
    records: Vec<ImportRecord>,
    reason: Option<String>,
    author: &str,
) -> Result<ImportSummary> {
    if author.trim().is_empty() {
        return Err(Error::invalid(
            ValidationErrorCode::InvalidValue,
            "author is required",
        ));
    }

    let names = if records.iter().any(|r| r.campaign_id.is_none()) {
        Some(NameIndex::load(campaigns).await?)
    } else {
        None
    };

    let total = records.len();
    let mut summary = ImportSummary::default();
    for record in records {
        let target = match (record.campaign_id, record.campaign_name.as_deref(), &names) {
            (Some(id), _, _) => Ok(id),
            (None, Some(name), Some(names)) if !name.trim().is_empty() => names.lookup(name),
            _ => Err(Error::invalid(
                ValidationErrorCode::InvalidValue,
                "record needs a campaign_id or campaign_name",
            )),
        };
        let campaign_id = match target {
            Ok(id) => id,
            Err(e) => {
                warn!(campaign_name = ?record.campaign_name, error = %e, "override import failed");
                summary.failed.push(ImportFailure::new(&record, None, &e));
                continue;
            }
        };

        let fields = clean_fields(record.fields.clone());
        match resolver
            .apply_override(campaign_id, fields, reason.clone(), author)
            .await
        {
            Ok(_) => summary.imported += 1,
            Err(e) if e.error_code() == Some(ValidationErrorCode::NoOpOverride.code()) => {
                summary.skipped += 1;
            }
            Err(e) => {
                warn!(campaign_id, error = %e, "override import failed");
                summary
                    .failed
                    .push(ImportFailure::new(&record, Some(campaign_id), &e));
            }
        }
    }

    info!(
        total,
        imported = summary.imported,
        skipped = summary.skipped,
        failed = summary.failed.len(),
        author,
        "override import finished"
    );
    Ok(summary)
}
