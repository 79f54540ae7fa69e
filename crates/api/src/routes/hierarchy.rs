//! Rollup tree endpoint.

use axum::{extract::State, Json};
use dashboard_core::DisplayMode;
use rollup_engine::{Rollup, RollupOptions};
use serde::Deserialize;

use crate::extractors::{ApiQuery, DateRange};
use crate::response::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct HierarchyQuery {
    pub mode: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    #[serde(default)]
    pub include_inactive: bool,
}

/// GET /api/hierarchy - Rollup tree for a display mode (default `network`).
pub async fn hierarchy_handler(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<HierarchyQuery>,
) -> Result<Json<Rollup>, ApiError> {
    let mode = match query.mode.as_deref() {
        Some(mode) => mode.parse()?,
        None => DisplayMode::Network,
    };
    let range = DateRange {
        start: query.start,
        end: query.end,
    }
    .to_hours()?;
    let options = RollupOptions {
        include_inactive: query.include_inactive,
    };

    let rollup = state.dashboard.hierarchy(mode, range, options).await?;
    Ok(Json(rollup))
}
