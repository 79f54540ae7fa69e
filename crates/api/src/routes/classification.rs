//! Effective classification, overrides, history, suggestions and bulk import.

use axum::{extract::State, http::StatusCode, Json};
use dashboard_core::{
    CampaignId, ClassificationOverride, EffectiveClassification, OverrideFields, RuleMatch,
};
use rollup_engine::{ImportRecord, ImportSummary};
use serde::Deserialize;
use validator::Validate;

use crate::extractors::{ApiPath, ApiQuery, ValidatedJson};
use crate::response::{ApiError, ListResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct OverrideRequest {
    #[validate(length(max = 255))]
    pub network: Option<String>,
    #[validate(length(max = 255))]
    pub domain: Option<String>,
    #[validate(length(max = 255))]
    pub placement: Option<String>,
    #[validate(length(max = 255))]
    pub targeting: Option<String>,
    #[validate(length(max = 255))]
    pub special: Option<String>,
    #[validate(length(max = 500))]
    pub reason: Option<String>,
    #[validate(length(min = 1, max = 128))]
    pub author: String,
}

impl OverrideRequest {
    fn into_parts(self) -> (OverrideFields, Option<String>, String) {
        let fields = OverrideFields {
            network: self.network,
            domain: self.domain,
            placement: self.placement,
            targeting: self.targeting,
            special: self.special,
        };
        (fields, self.reason, self.author)
    }
}

#[derive(Debug, Deserialize)]
pub struct RevertQuery {
    pub author: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ImportRequest {
    #[validate(length(max = 500))]
    pub reason: Option<String>,
    #[validate(length(min = 1, max = 128))]
    pub author: String,
    /// At most 5000 per request
    #[validate(length(min = 1, max = 5000))]
    pub records: Vec<ImportRecord>,
}

/// GET /api/campaigns/:id/classification
pub async fn get_handler(
    State(state): State<AppState>,
    ApiPath(campaign_id): ApiPath<CampaignId>,
) -> Result<Json<EffectiveClassification>, ApiError> {
    let effective = state.dashboard.effective_classification(campaign_id).await?;
    Ok(Json(effective))
}

/// PUT /api/campaigns/:id/classification - Replace the active override.
pub async fn apply_handler(
    State(state): State<AppState>,
    ApiPath(campaign_id): ApiPath<CampaignId>,
    ValidatedJson(body): ValidatedJson<OverrideRequest>,
) -> Result<Json<EffectiveClassification>, ApiError> {
    let (fields, reason, author) = body.into_parts();
    let effective = state
        .dashboard
        .apply_override(campaign_id, fields, reason, &author)
        .await?;
    Ok(Json(effective))
}

/// DELETE /api/campaigns/:id/classification - Revert to the base mapping.
pub async fn revert_handler(
    State(state): State<AppState>,
    ApiPath(campaign_id): ApiPath<CampaignId>,
    ApiQuery(query): ApiQuery<RevertQuery>,
) -> Result<StatusCode, ApiError> {
    state
        .dashboard
        .revert_override(campaign_id, &query.author)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/campaigns/:id/classification/history
pub async fn history_handler(
    State(state): State<AppState>,
    ApiPath(campaign_id): ApiPath<CampaignId>,
    ApiQuery(query): ApiQuery<HistoryQuery>,
) -> Result<Json<ListResponse<ClassificationOverride>>, ApiError> {
    let limit = state.limits.resolve(query.limit)?;
    let history = state.dashboard.override_history(campaign_id, limit).await?;
    Ok(Json(history.into()))
}

/// GET /api/campaigns/:id/classification/suggestion
pub async fn suggestion_handler(
    State(state): State<AppState>,
    ApiPath(campaign_id): ApiPath<CampaignId>,
) -> Result<Json<RuleMatch>, ApiError> {
    let suggestion = state.dashboard.suggest_classification(campaign_id).await?;
    Ok(Json(suggestion))
}

/// POST /api/classification/import
pub async fn import_handler(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<ImportRequest>,
) -> Result<Json<ImportSummary>, ApiError> {
    let summary = state
        .dashboard
        .import_overrides(body.records, body.reason, &body.author)
        .await?;
    Ok(Json(summary))
}
