//! Classification taxonomy: base mappings, manual overrides, and the merged
//! effective classification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::campaign::CampaignId;

/// Bucket key for campaigns with no classification at a grouping level.
pub const UNMAPPED: &str = "Unmapped";

/// Longest accepted classification value.
pub const MAX_FIELD_LEN: usize = 255;

/// The five classification dimensions, in hierarchy order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationField {
    Network,
    Domain,
    Placement,
    Targeting,
    Special,
}

impl ClassificationField {
    pub const ALL: [ClassificationField; 5] = [
        Self::Network,
        Self::Domain,
        Self::Placement,
        Self::Targeting,
        Self::Special,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Domain => "domain",
            Self::Placement => "placement",
            Self::Targeting => "targeting",
            Self::Special => "special",
        }
    }
}

impl fmt::Display for ClassificationField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Automatic (rule-matched) classification for one campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationMapping {
    pub campaign_id: CampaignId,
    pub network: String,
    pub domain: String,
    pub placement: String,
    pub targeting: String,
    pub special: String,
    /// Match confidence in [0, 1]
    pub confidence: f64,
    pub updated_at: DateTime<Utc>,
}

impl ClassificationMapping {
    pub fn get(&self, field: ClassificationField) -> &str {
        match field {
            ClassificationField::Network => &self.network,
            ClassificationField::Domain => &self.domain,
            ClassificationField::Placement => &self.placement,
            ClassificationField::Targeting => &self.targeting,
            ClassificationField::Special => &self.special,
        }
    }
}

/// A subset of classification fields. `None` means "inherit base".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideFields {
    #[serde(default)]
    pub network: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub placement: Option<String>,
    #[serde(default)]
    pub targeting: Option<String>,
    #[serde(default)]
    pub special: Option<String>,
}

impl OverrideFields {
    pub fn get(&self, field: ClassificationField) -> Option<&str> {
        match field {
            ClassificationField::Network => self.network.as_deref(),
            ClassificationField::Domain => self.domain.as_deref(),
            ClassificationField::Placement => self.placement.as_deref(),
            ClassificationField::Targeting => self.targeting.as_deref(),
            ClassificationField::Special => self.special.as_deref(),
        }
    }

    pub fn set(&mut self, field: ClassificationField, value: Option<String>) {
        let slot = match field {
            ClassificationField::Network => &mut self.network,
            ClassificationField::Domain => &mut self.domain,
            ClassificationField::Placement => &mut self.placement,
            ClassificationField::Targeting => &mut self.targeting,
            ClassificationField::Special => &mut self.special,
        };
        *slot = value;
    }

    /// Trims every value; blank values become unset.
    pub fn normalized(&self) -> Self {
        let mut out = Self::default();
        for field in ClassificationField::ALL {
            let value = self
                .get(field)
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string);
            out.set(field, value);
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        ClassificationField::ALL.iter().all(|f| self.get(*f).is_none())
    }

    /// Fields this subset sets, in hierarchy order.
    pub fn set_fields(&self) -> Vec<ClassificationField> {
        ClassificationField::ALL
            .into_iter()
            .filter(|f| self.get(*f).is_some())
            .collect()
    }
}

/// A stored manual override row. Rows are never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationOverride {
    pub id: i64,
    pub campaign_id: CampaignId,
    pub fields: OverrideFields,
    pub reason: Option<String>,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub active: bool,
    /// When the row stopped being active, by revert or replacement
    #[serde(default)]
    pub deactivated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub deactivated_by: Option<String>,
}

/// Override row to be inserted as the campaign's single active override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOverride {
    pub campaign_id: CampaignId,
    pub fields: OverrideFields,
    pub reason: Option<String>,
    pub author: String,
    /// Id of the active override the caller read before writing, `None` if
    /// there was none. The store rejects the write with a conflict when the
    /// active row has changed since.
    #[serde(default)]
    pub expected_active: Option<i64>,
}

/// The classification in force after layering the active override over the
/// base mapping. Derived on every read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectiveClassification {
    pub campaign_id: CampaignId,
    pub network: String,
    pub domain: String,
    pub placement: String,
    pub targeting: String,
    pub special: String,
    pub confidence: f64,
    /// Fields whose value came from the active override
    pub overridden_fields: Vec<ClassificationField>,
    /// Id of the active override row, if any
    pub override_id: Option<i64>,
}

impl EffectiveClassification {
    /// Merge the active override (if any) over the base mapping, field by field.
    pub fn resolve(
        base: &ClassificationMapping,
        active: Option<&ClassificationOverride>,
    ) -> Self {
        let pick = |field: ClassificationField| -> (String, bool) {
            match active.and_then(|o| o.fields.get(field)) {
                Some(value) => (value.to_string(), true),
                None => (base.get(field).to_string(), false),
            }
        };

        let mut overridden_fields = Vec::new();
        let mut values: [String; 5] = Default::default();
        for (slot, field) in values.iter_mut().zip(ClassificationField::ALL) {
            let (value, from_override) = pick(field);
            if from_override {
                overridden_fields.push(field);
            }
            *slot = value;
        }
        let [network, domain, placement, targeting, special] = values;

        Self {
            campaign_id: base.campaign_id,
            network,
            domain,
            placement,
            targeting,
            special,
            confidence: base.confidence,
            overridden_fields,
            override_id: active.map(|o| o.id),
        }
    }

    pub fn get(&self, field: ClassificationField) -> &str {
        match field {
            ClassificationField::Network => &self.network,
            ClassificationField::Domain => &self.domain,
            ClassificationField::Placement => &self.placement,
            ClassificationField::Targeting => &self.targeting,
            ClassificationField::Special => &self.special,
        }
    }

    pub fn is_overridden(&self) -> bool {
        self.override_id.is_some()
    }
}

/// Grouping key value for a possibly unclassified campaign.
pub fn group_key(classification: Option<&EffectiveClassification>, field: ClassificationField) -> String {
    match classification {
        Some(c) => {
            let value = c.get(field).trim();
            if value.is_empty() {
                UNMAPPED.to_string()
            } else {
                value.to_string()
            }
        }
        None => UNMAPPED.to_string(),
    }
}
