//! Period time-series endpoint.

use axum::{extract::State, Json};
use dashboard_core::{CampaignId, Error, Granularity, ValidationErrorCode};
use rollup_engine::TimeSeriesPoint;
use serde::Deserialize;

use crate::extractors::{ApiQuery, DateRange};
use crate::response::{ApiError, ListResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TimeSeriesQuery {
    pub start: Option<String>,
    pub end: Option<String>,
    pub granularity: Option<String>,
    /// Comma-separated campaign ids; absent means every campaign
    pub campaign_ids: Option<String>,
}

/// GET /api/timeseries - Summed counters per period (default `day`).
pub async fn timeseries_handler(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<TimeSeriesQuery>,
) -> Result<Json<ListResponse<TimeSeriesPoint>>, ApiError> {
    let granularity = match query.granularity.as_deref() {
        Some(g) => g.parse()?,
        None => Granularity::Day,
    };
    let range = DateRange {
        start: query.start,
        end: query.end,
    }
    .to_hours()?;
    let ids = query
        .campaign_ids
        .as_deref()
        .map(parse_campaign_ids)
        .transpose()?;

    let series = state
        .dashboard
        .time_series(ids.as_deref(), range, granularity)
        .await?;
    Ok(Json(series.into()))
}

fn parse_campaign_ids(raw: &str) -> Result<Vec<CampaignId>, Error> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<CampaignId>().map_err(|_| {
                Error::invalid(
                    ValidationErrorCode::InvalidValue,
                    format!("invalid campaign id '{}'", s),
                )
            })
        })
        .collect()
}
