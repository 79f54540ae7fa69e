//! Postgres table schemas.

use dashboard_core::Result;
use sqlx::PgPool;

use crate::error::map_sqlx_error;

pub const CREATE_CAMPAIGNS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS campaigns (
    id BIGINT PRIMARY KEY,
    name TEXT NOT NULL,
    is_serving BOOLEAN NOT NULL DEFAULT FALSE,
    traffic_weight INTEGER NOT NULL DEFAULT 0,
    status TEXT NULL,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
)
"#;

/// Base (automatic) classification, one row per campaign.
pub const CREATE_MAPPINGS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS classification_mappings (
    campaign_id BIGINT PRIMARY KEY REFERENCES campaigns (id),
    network TEXT NOT NULL,
    domain TEXT NOT NULL,
    placement TEXT NOT NULL,
    targeting TEXT NOT NULL,
    special TEXT NOT NULL,
    confidence DOUBLE PRECISION NOT NULL DEFAULT 1.0,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
)
"#;

/// Manual overrides. NULL field means inherit the base value.
pub const CREATE_OVERRIDES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS classification_overrides (
    id BIGSERIAL PRIMARY KEY,
    campaign_id BIGINT NOT NULL REFERENCES campaigns (id),
    network TEXT NULL,
    domain TEXT NULL,
    placement TEXT NULL,
    targeting TEXT NULL,
    special TEXT NULL,
    reason TEXT NULL,
    author TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    active BOOLEAN NOT NULL DEFAULT TRUE,
    deactivated_at TIMESTAMPTZ NULL,
    deactivated_by TEXT NULL
)
"#;

/// Upgrades override tables created before deactivation was audited.
pub const ADD_OVERRIDE_DEACTIVATED_AT: &str = r#"
ALTER TABLE classification_overrides ADD COLUMN IF NOT EXISTS deactivated_at TIMESTAMPTZ NULL
"#;

pub const ADD_OVERRIDE_DEACTIVATED_BY: &str = r#"
ALTER TABLE classification_overrides ADD COLUMN IF NOT EXISTS deactivated_by TEXT NULL
"#;

/// Manual cost entries. Open dates leave that end of the billing period open.
pub const CREATE_COST_OVERRIDES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS campaign_cost_overrides (
    id BIGSERIAL PRIMARY KEY,
    campaign_id BIGINT NOT NULL REFERENCES campaigns (id),
    cost DOUBLE PRECISION NOT NULL CHECK (cost >= 0),
    cost_status TEXT NOT NULL DEFAULT 'confirmed'
        CHECK (cost_status IN ('estimated', 'confirmed', 'api_sourced')),
    start_date DATE NULL,
    end_date DATE NULL,
    reason TEXT NULL,
    author TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    active BOOLEAN NOT NULL DEFAULT TRUE,
    deactivated_at TIMESTAMPTZ NULL,
    deactivated_by TEXT NULL,
    CHECK (start_date IS NULL OR end_date IS NULL OR start_date <= end_date)
)
"#;

/// At most one active override per campaign.
pub const CREATE_ONE_ACTIVE_INDEX: &str = r#"
CREATE UNIQUE INDEX IF NOT EXISTS uq_classification_overrides_active
    ON classification_overrides (campaign_id) WHERE active
"#;

pub const CREATE_HISTORY_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_classification_overrides_history
    ON classification_overrides (campaign_id, created_at DESC, id DESC)
"#;

/// At most one active cost entry per campaign.
pub const CREATE_ONE_ACTIVE_COST_INDEX: &str = r#"
CREATE UNIQUE INDEX IF NOT EXISTS uq_campaign_cost_overrides_active
    ON campaign_cost_overrides (campaign_id) WHERE active
"#;

pub const CREATE_COST_HISTORY_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_campaign_cost_overrides_history
    ON campaign_cost_overrides (campaign_id, created_at DESC, id DESC)
"#;

pub fn all_statements() -> [&'static str; 10] {
    [
        CREATE_CAMPAIGNS_TABLE,
        CREATE_MAPPINGS_TABLE,
        CREATE_OVERRIDES_TABLE,
        CREATE_COST_OVERRIDES_TABLE,
        ADD_OVERRIDE_DEACTIVATED_AT,
        ADD_OVERRIDE_DEACTIVATED_BY,
        CREATE_ONE_ACTIVE_INDEX,
        CREATE_HISTORY_INDEX,
        CREATE_ONE_ACTIVE_COST_INDEX,
        CREATE_COST_HISTORY_INDEX,
    ]
}

/// Create tables and indexes if they don't exist.
pub async fn init_schema(pool: &PgPool) -> Result<()> {
    for sql in all_statements() {
        sqlx::query(sql)
            .execute(pool)
            .await
            .map_err(|e| map_sqlx_error("init_schema", e))?;
    }
    Ok(())
}
