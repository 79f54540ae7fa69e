//! API routes.

pub mod campaigns;
pub mod classification;
pub mod health;
pub mod hierarchy;
pub mod kpi;
pub mod quality;
pub mod timeseries;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::state::AppState;

/// Creates the API router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/hierarchy", get(hierarchy::hierarchy_handler))
        .route(
            "/campaigns/:id/classification",
            get(classification::get_handler)
                .put(classification::apply_handler)
                .delete(classification::revert_handler),
        )
        .route(
            "/campaigns/:id/classification/history",
            get(classification::history_handler),
        )
        .route(
            "/campaigns/:id/classification/suggestion",
            get(classification::suggestion_handler),
        )
        .route("/campaigns/:id/cost", put(campaigns::cost_handler))
        .route(
            "/campaigns/:id/cost/history",
            get(campaigns::cost_history_handler),
        )
        .route("/campaigns/:id/status", put(campaigns::status_handler))
        .route("/classification/import", post(classification::import_handler))
        .route("/kpi/top-performers", get(kpi::top_performers_handler))
        .route("/kpi/top-networks", get(kpi::top_networks_handler))
        .route("/timeseries", get(timeseries::timeseries_handler))
        .route("/quality", get(quality::quality_handler));

    Router::new()
        .nest("/api", api)
        .route("/health", get(health::health_handler))
        .route("/health/ready", get(health::ready_handler))
        .route("/health/live", get(health::live_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors),
        )
        .with_state(state)
}
