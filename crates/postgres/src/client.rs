//! Connection pool setup.

use crate::config::PostgresConfig;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::info;

/// Build a lazily-connecting pool. Connections are opened on first use, so a
/// database outage surfaces through health checks instead of failing startup.
pub fn connect_lazy(config: &PostgresConfig) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs.max(1)))
        .connect_lazy(&config.url)?;

    info!(
        max_connections = config.max_connections,
        "Created Postgres pool"
    );
    Ok(pool)
}
