//! ClickHouse health checks.

use crate::client::ClickHouseClient;
use telemetry::health;
use tracing::{debug, error};

/// Ping ClickHouse and record the outcome in the health registry.
pub async fn check_connection(client: &ClickHouseClient) -> bool {
    let ping = client.inner().query("SELECT 1").fetch_one::<u8>();
    match tokio::time::timeout(client.timeout(), ping).await {
        Ok(Ok(_)) => {
            debug!("ClickHouse connection healthy");
            health().clickhouse.set_healthy();
            true
        }
        Ok(Err(e)) => {
            error!("ClickHouse health check failed: {}", e);
            health().clickhouse.set_unhealthy(e.to_string());
            false
        }
        Err(_) => {
            error!("ClickHouse health check timed out");
            health().clickhouse.set_unhealthy("health check timed out");
            false
        }
    }
}
