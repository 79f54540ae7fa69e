//! Manual campaign cost and status edits.

use axum::{extract::State, Json};
use dashboard_core::{
    parse_date, Campaign, CampaignId, CampaignStatus, CostOverride, CostStatus, CostUpdate,
};
use serde::Deserialize;
use validator::Validate;

use crate::extractors::{ApiPath, ApiQuery, ValidatedJson};
use crate::response::{ApiError, ListResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CostRequest {
    #[validate(range(min = 0.0))]
    pub cost: f64,
    /// Defaults to `confirmed` for manual entries
    #[serde(default)]
    pub cost_status: Option<CostStatus>,
    /// Billing period as `YYYY-MM-DD`; either end may be omitted
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[validate(length(max = 500))]
    pub reason: Option<String>,
    #[validate(length(min = 1, max = 128))]
    pub author: String,
}

impl CostRequest {
    fn to_update(&self) -> Result<CostUpdate, ApiError> {
        let start = self.start_date.as_deref().map(parse_date).transpose()?;
        let end = self.end_date.as_deref().map(parse_date).transpose()?;
        let status = self.cost_status.unwrap_or(CostStatus::Confirmed);
        Ok(CostUpdate::new(self.cost, status)?.for_period(start, end)?)
    }
}

#[derive(Debug, Deserialize)]
pub struct CostHistoryQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct StatusRequest {
    #[validate(length(min = 1, max = 32))]
    pub status: String,
}

/// PUT /api/campaigns/:id/cost - Record a cost edit as the new active entry.
pub async fn cost_handler(
    State(state): State<AppState>,
    ApiPath(campaign_id): ApiPath<CampaignId>,
    ValidatedJson(body): ValidatedJson<CostRequest>,
) -> Result<Json<CostOverride>, ApiError> {
    let update = body.to_update()?;
    let stored = state
        .dashboard
        .update_campaign_cost(campaign_id, update, body.reason, &body.author)
        .await?;
    Ok(Json(stored))
}

/// GET /api/campaigns/:id/cost/history
pub async fn cost_history_handler(
    State(state): State<AppState>,
    ApiPath(campaign_id): ApiPath<CampaignId>,
    ApiQuery(query): ApiQuery<CostHistoryQuery>,
) -> Result<Json<ListResponse<CostOverride>>, ApiError> {
    let limit = state.limits.resolve(query.limit)?;
    let history = state.dashboard.cost_history(campaign_id, limit).await?;
    Ok(Json(history.into()))
}

/// PUT /api/campaigns/:id/status
pub async fn status_handler(
    State(state): State<AppState>,
    ApiPath(campaign_id): ApiPath<CampaignId>,
    ValidatedJson(body): ValidatedJson<StatusRequest>,
) -> Result<Json<Campaign>, ApiError> {
    let status: CampaignStatus = body.status.parse()?;
    let campaign = state
        .dashboard
        .set_campaign_status(campaign_id, status)
        .await?;
    Ok(Json(campaign))
}
