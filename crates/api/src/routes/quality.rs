use axum::{extract::State, Json};
use rollup_engine::DataQualityReport;

use crate::extractors::{ApiQuery, DateRange};
use crate::response::ApiError;
use crate::state::AppState;

/// GET /api/quality
pub async fn quality_handler(
    State(state): State<AppState>,
    ApiQuery(range): ApiQuery<DateRange>,
) -> Result<Json<DataQualityReport>, ApiError> {
    let report = state.dashboard.data_quality(range.to_hours()?).await?;
    Ok(Json(report))
}
