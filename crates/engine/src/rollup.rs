//! Hierarchical rollups.
//!
//! Campaigns are grouped by the classification fields a [`DisplayMode`]
//! selects, outermost first. Group nodes never query facts themselves: their
//! counters and cost are the sum of their children, and every rate is derived
//! again from those sums.

use dashboard_core::{
    group_key, AggregatedMetrics, Campaign, CampaignId, CampaignStatus, ClassificationField,
    CostStatus, DisplayMode, EffectiveClassification, HourRange, RawCounters,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollupOptions {
    /// Include every known campaign, with zero counters when it has no facts
    #[serde(default)]
    pub include_inactive: bool,
}

/// Everything the builder needs to know about one campaign.
#[derive(Debug, Clone, PartialEq)]
pub struct CampaignRecord {
    pub campaign: Campaign,
    /// `None` when the campaign has no base mapping
    pub classification: Option<EffectiveClassification>,
    pub counters: RawCounters,
    /// Share of the active cost entry attributed to the queried range
    pub cost: f64,
    /// Provenance of the active cost entry; `None` when no cost was entered
    pub cost_status: Option<CostStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignLeaf {
    pub campaign_id: CampaignId,
    pub name: String,
    pub status: CampaignStatus,
    pub cost_status: Option<CostStatus>,
    pub classification: Option<EffectiveClassification>,
    pub metrics: AggregatedMetrics,
}

impl From<CampaignRecord> for CampaignLeaf {
    fn from(record: CampaignRecord) -> Self {
        let metrics = AggregatedMetrics::new(record.counters, record.cost);
        Self {
            campaign_id: record.campaign.id,
            status: record.campaign.effective_status(),
            cost_status: record.cost_status,
            name: record.campaign.name,
            classification: record.classification,
            metrics,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupNode {
    pub name: String,
    pub level: ClassificationField,
    /// Grouping values from the outermost level down to this node
    pub path: Vec<String>,
    pub campaign_count: usize,
    pub metrics: AggregatedMetrics,
    pub children: Vec<HierarchyNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HierarchyNode {
    Group(GroupNode),
    Campaign(CampaignLeaf),
}

impl HierarchyNode {
    pub fn metrics(&self) -> &AggregatedMetrics {
        match self {
            Self::Group(g) => &g.metrics,
            Self::Campaign(c) => &c.metrics,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Group(g) => &g.name,
            Self::Campaign(c) => &c.name,
        }
    }

    pub fn children(&self) -> &[HierarchyNode] {
        match self {
            Self::Group(g) => &g.children,
            Self::Campaign(_) => &[],
        }
    }

    pub fn campaign_count(&self) -> usize {
        match self {
            Self::Group(g) => g.campaign_count,
            Self::Campaign(_) => 1,
        }
    }

    /// This node plus all descendants.
    pub fn node_count(&self) -> usize {
        1 + self.children().iter().map(Self::node_count).sum::<usize>()
    }
}

/// A complete rollup for one display mode and range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rollup {
    pub mode: DisplayMode,
    pub range: HourRange,
    pub campaign_count: usize,
    pub totals: AggregatedMetrics,
    pub nodes: Vec<HierarchyNode>,
}

impl Rollup {
    pub fn node_count(&self) -> usize {
        self.nodes.iter().map(HierarchyNode::node_count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Build the rollup tree for `mode` from per-campaign records.
pub fn build(mode: DisplayMode, range: HourRange, records: Vec<CampaignRecord>) -> Rollup {
    let campaign_count = records.len();
    let leaves: Vec<CampaignLeaf> = records.into_iter().map(CampaignLeaf::from).collect();
    let nodes = group(leaves, mode.levels(), Vec::new());
    let totals = AggregatedMetrics::combine(nodes.iter().map(HierarchyNode::metrics));

    Rollup {
        mode,
        range,
        campaign_count,
        totals,
        nodes,
    }
}

fn group(
    mut leaves: Vec<CampaignLeaf>,
    levels: &[ClassificationField],
    path: Vec<String>,
) -> Vec<HierarchyNode> {
    let Some((&level, rest)) = levels.split_first() else {
        leaves.sort_by(|a, b| a.name.cmp(&b.name).then(a.campaign_id.cmp(&b.campaign_id)));
        return leaves.into_iter().map(HierarchyNode::Campaign).collect();
    };

    let mut buckets: BTreeMap<String, Vec<CampaignLeaf>> = BTreeMap::new();
    for leaf in leaves {
        let key = group_key(leaf.classification.as_ref(), level);
        buckets.entry(key).or_default().push(leaf);
    }

    buckets
        .into_iter()
        .map(|(name, members)| {
            let mut child_path = path.clone();
            child_path.push(name.clone());
            let children = group(members, rest, child_path.clone());
            let metrics = AggregatedMetrics::combine(children.iter().map(HierarchyNode::metrics));
            let campaign_count = children.iter().map(HierarchyNode::campaign_count).sum();
            HierarchyNode::Group(GroupNode {
                name,
                level,
                path: child_path,
                campaign_count,
                metrics,
                children,
            })
        })
        .collect()
}
