//! Postgres health checks.

use sqlx::PgPool;
use telemetry::health;
use tracing::{debug, error};

/// Ping Postgres and record the outcome in the health registry.
pub async fn check_connection(pool: &PgPool) -> bool {
    match sqlx::query("SELECT 1").execute(pool).await {
        Ok(_) => {
            debug!("Postgres connection healthy");
            health().postgres.set_healthy();
            true
        }
        Err(e) => {
            error!("Postgres health check failed: {}", e);
            health().postgres.set_unhealthy(e.to_string());
            false
        }
    }
}
