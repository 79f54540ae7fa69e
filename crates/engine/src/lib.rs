//! Override resolution, hierarchical rollups, and KPI rankings over the
//! dashboard's fact and classification stores.
//!
//! - [`resolver`]: effective classification and the override audit trail
//! - [`rollup`]: display-mode driven aggregation trees
//! - [`ranking`]: top performers and top networks
//! - [`timeseries`] / [`quality`]: period series and data-quality reports
//! - [`service`]: the [`Dashboard`] facade used by the HTTP layer

pub mod import;
pub mod memory;
pub mod quality;
pub mod ranking;
pub mod resolver;
pub mod rollup;
pub mod service;
pub mod timeseries;

pub use import::{ImportFailure, ImportRecord, ImportSummary};
pub use quality::{CampaignQuality, DataQualityReport};
pub use ranking::{NetworkEntry, PerformerEntry};
pub use resolver::OverrideResolver;
pub use rollup::{CampaignLeaf, CampaignRecord, GroupNode, HierarchyNode, Rollup, RollupOptions};
pub use service::Dashboard;
pub use timeseries::TimeSeriesPoint;
