//! HTTP API for campaign rollups, classification overrides, and KPIs.

pub mod extractors;
pub mod response;
pub mod routes;
pub mod state;

pub use routes::router;
pub use state::{ApiLimits, AppState};
