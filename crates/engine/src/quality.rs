//! Data-quality scoring and warnings over per-campaign sums.

use dashboard_core::{round2, safe_div, safe_pct, CampaignId, RawCounters};
use serde::Serialize;

use crate::rollup::CampaignRecord;

/// Score below which a campaign counts as low quality.
pub const LOW_QUALITY_THRESHOLD: f64 = 0.5;
/// Registration rate (percent) above which a campaign is flagged.
pub const HIGH_REGISTRATION_RATE_PCT: f64 = 50.0;
const UNMAPPED_NAMES_SHOWN: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignQuality {
    pub campaign_id: CampaignId,
    pub name: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataQualityReport {
    pub campaigns_analyzed: usize,
    pub average_score: f64,
    pub unmapped_count: usize,
    pub zero_session_count: usize,
    pub high_registration_rate_count: usize,
    pub low_quality_count: usize,
    pub warnings: Vec<String>,
    pub campaigns: Vec<CampaignQuality>,
}

/// Completeness and plausibility score in [0, 1].
pub fn quality_score(raw: &RawCounters) -> f64 {
    let mut score = 1.0;

    let missing_critical = [raw.sessions, raw.registrations, raw.credit_cards]
        .iter()
        .filter(|v| **v == 0)
        .count();
    score -= 0.2 * missing_critical as f64;

    if raw.sessions > 0 {
        let reg_rate = safe_div(raw.registrations as f64, raw.sessions as f64);
        if reg_rate > 0.5 {
            score -= 0.3;
        } else if reg_rate < 0.001 {
            score -= 0.2;
        }
    }

    if raw.registrations > raw.sessions {
        score -= 0.5;
    }

    f64::clamp(score, 0.0, 1.0)
}

pub fn build_report(records: &[CampaignRecord]) -> DataQualityReport {
    let mut warnings = Vec::new();
    if records.is_empty() {
        warnings.push("No performance data to validate".to_string());
    }

    let campaigns: Vec<CampaignQuality> = records
        .iter()
        .map(|r| CampaignQuality {
            campaign_id: r.campaign.id,
            name: r.campaign.name.clone(),
            score: round2(quality_score(&r.counters)),
        })
        .collect();

    let low_quality_count = campaigns
        .iter()
        .filter(|c| c.score < LOW_QUALITY_THRESHOLD)
        .count();
    if low_quality_count > 0 {
        warnings.push(format!(
            "{} campaigns have low data quality scores",
            low_quality_count
        ));
    }

    let unmapped: Vec<&str> = records
        .iter()
        .filter(|r| r.classification.is_none())
        .map(|r| r.campaign.name.as_str())
        .collect();
    if !unmapped.is_empty() {
        let shown = unmapped[..unmapped.len().min(UNMAPPED_NAMES_SHOWN)].join(", ");
        if unmapped.len() <= UNMAPPED_NAMES_SHOWN {
            warnings.push(format!(
                "{} campaigns are unmapped in hierarchy: {}",
                unmapped.len(),
                shown
            ));
        } else {
            warnings.push(format!(
                "{} campaigns are unmapped in hierarchy (first {}: {}...)",
                unmapped.len(),
                UNMAPPED_NAMES_SHOWN,
                shown
            ));
        }
    }

    let zero_session_count = records.iter().filter(|r| r.counters.sessions == 0).count();
    if zero_session_count > 0 {
        warnings.push(format!("{} campaigns have zero sessions", zero_session_count));
    }

    let high_registration_rate_count = records
        .iter()
        .filter(|r| {
            safe_pct(r.counters.registrations, r.counters.sessions) > HIGH_REGISTRATION_RATE_PCT
        })
        .count();
    if high_registration_rate_count > 0 {
        warnings.push(format!(
            "{} campaigns have suspiciously high registration rates (>50%)",
            high_registration_rate_count
        ));
    }

    let average_score = round2(safe_div(
        campaigns.iter().map(|c| c.score).sum::<f64>(),
        campaigns.len() as f64,
    ));

    DataQualityReport {
        campaigns_analyzed: records.len(),
        average_score,
        unmapped_count: unmapped.len(),
        zero_session_count,
        high_registration_rate_count,
        low_quality_count,
        warnings,
        campaigns,
    }
}
