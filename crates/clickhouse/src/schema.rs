//! ClickHouse table schemas.
//!
//! Facts are written by the external sync job; this crate only creates the
//! table for local setups and reads from it.

use crate::client::ClickHouseClient;
use dashboard_core::{Error, Result};

pub const FACTS_TABLE: &str = "hourly_facts";

/// Database DDL.
pub fn create_database(database: &str) -> String {
    format!("CREATE DATABASE IF NOT EXISTS {}", database)
}

/// Per-campaign, per-hour counters. The sync job re-sends whole hours, so the
/// newest `synced_at` version of a (campaign_id, unix_hour) row wins.
pub fn create_facts_table(database: &str) -> String {
    format!(
        r#"
CREATE TABLE IF NOT EXISTS {db}.{table} (
    campaign_id Int64,
    unix_hour Int64,

    sessions UInt32,
    registrations UInt32,
    messages UInt32,
    converted_users UInt32,

    total_accounts UInt32,
    credit_cards UInt32,
    email_accounts UInt32,
    google_accounts UInt32,
    payment_methods UInt32,

    synced_at DateTime DEFAULT now()
)
ENGINE = ReplacingMergeTree(synced_at)
PARTITION BY toYYYYMM(toDateTime(unix_hour * 3600, 'UTC'))
ORDER BY (campaign_id, unix_hour)
SETTINGS index_granularity = 8192
"#,
        db = database,
        table = FACTS_TABLE
    )
}

pub fn all_statements(database: &str) -> Vec<String> {
    vec![create_database(database), create_facts_table(database)]
}

/// Create the database and fact table if they don't exist.
pub async fn init_schema(client: &ClickHouseClient) -> Result<()> {
    for sql in all_statements(client.database()) {
        client
            .inner()
            .query(&sql)
            .execute()
            .await
            .map_err(|e| Error::unavailable(format!("ClickHouse schema init failed: {}", e)))?;
    }
    Ok(())
}
