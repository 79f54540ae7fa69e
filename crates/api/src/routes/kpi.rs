//! KPI ranking endpoints.

use axum::{extract::State, Json};
use rollup_engine::{NetworkEntry, PerformerEntry};
use serde::Deserialize;

use crate::extractors::{ApiQuery, DateRange};
use crate::response::{ApiError, ListResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct KpiQuery {
    pub start: Option<String>,
    pub end: Option<String>,
    pub limit: Option<usize>,
}

/// GET /api/kpi/top-performers
pub async fn top_performers_handler(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<KpiQuery>,
) -> Result<Json<ListResponse<PerformerEntry>>, ApiError> {
    let limit = state.limits.resolve(query.limit)?;
    let range = DateRange {
        start: query.start,
        end: query.end,
    }
    .to_hours()?;
    let top = state.dashboard.top_performers(range, limit).await?;
    Ok(Json(top.into()))
}

/// GET /api/kpi/top-networks
pub async fn top_networks_handler(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<KpiQuery>,
) -> Result<Json<ListResponse<NetworkEntry>>, ApiError> {
    let limit = state.limits.resolve(query.limit)?;
    let range = DateRange {
        start: query.start,
        end: query.end,
    }
    .to_hours()?;
    let top = state.dashboard.top_networks(range, limit).await?;
    Ok(Json(top.into()))
}
