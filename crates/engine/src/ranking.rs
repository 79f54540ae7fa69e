//! KPI rankings: top campaigns by weighted score and top networks by sessions.

use dashboard_core::{
    derive_rates, group_key, round2, AggregatedMetrics, CampaignId, ClassificationField,
    DerivedMetrics, RawCounters,
};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::rollup::CampaignRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformerEntry {
    pub rank: usize,
    pub campaign_id: CampaignId,
    pub name: String,
    pub network: String,
    pub score: f64,
    pub raw: RawCounters,
    pub rates: DerivedMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkEntry {
    pub rank: usize,
    pub network: String,
    pub campaign_count: usize,
    pub metrics: AggregatedMetrics,
}

/// Campaigns ranked by `0.3*sessions + 0.4*registrations + 0.3*converted`,
/// best first. Zero-session campaigns are not ranked; ties go to the lower id.
pub fn top_performers(records: &[CampaignRecord], limit: usize) -> Vec<PerformerEntry> {
    let mut ranked: Vec<(&CampaignRecord, f64)> = records
        .iter()
        .filter(|r| r.counters.sessions > 0)
        .map(|r| (r, r.counters.performance_score()))
        .collect();

    ranked.sort_by(|(a, sa), (b, sb)| {
        sb.total_cmp(sa)
            .then_with(|| a.campaign.id.cmp(&b.campaign.id))
    });

    ranked
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, (record, score))| PerformerEntry {
            rank: i + 1,
            campaign_id: record.campaign.id,
            name: record.campaign.name.clone(),
            network: group_key(record.classification.as_ref(), ClassificationField::Network),
            score: round2(score),
            raw: record.counters,
            rates: derive_rates(&record.counters).rounded(),
        })
        .collect()
}

/// Networks ranked by summed sessions, ties by name. Networks with no
/// sessions are left out.
pub fn top_networks(records: &[CampaignRecord], limit: usize) -> Vec<NetworkEntry> {
    let mut networks: BTreeMap<String, (usize, RawCounters, f64)> = BTreeMap::new();
    for record in records {
        let key = group_key(record.classification.as_ref(), ClassificationField::Network);
        let entry = networks.entry(key).or_default();
        entry.0 += 1;
        entry.1 += record.counters;
        entry.2 += record.cost;
    }

    let mut ranked: Vec<(String, usize, AggregatedMetrics)> = networks
        .into_iter()
        .filter(|(_, (_, raw, _))| raw.sessions > 0)
        .map(|(name, (count, raw, cost))| (name, count, AggregatedMetrics::new(raw, cost)))
        .collect();

    ranked.sort_by(|a, b| {
        b.2.raw
            .sessions
            .cmp(&a.2.raw.sessions)
            .then_with(|| a.0.cmp(&b.0))
    });

    ranked
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, (network, campaign_count, metrics))| NetworkEntry {
            rank: i + 1,
            network,
            campaign_count,
            metrics,
        })
        .collect()
}
