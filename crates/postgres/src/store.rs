//! [`ClassificationStore`] and [`CampaignStore`] over Postgres.
//!
//! Override and cost writes for one campaign are serialized by a
//! transaction-scoped advisory lock on the campaign id. The partial unique
//! indexes on `(campaign_id) WHERE active` reject anything that slips past
//! it, and that rejection surfaces as a conflict.

use async_trait::async_trait;
use dashboard_core::{
    Campaign, CampaignId, CampaignStatus, CampaignStore, ClassificationMapping,
    ClassificationOverride, ClassificationStore, CostOverride, Error, NewCostOverride, NewOverride,
    Result,
};
use sqlx::PgPool;
use std::collections::HashMap;
use std::future::Future;
use std::time::Instant;
use telemetry::{health, metrics};
use tracing::debug;

use crate::error::map_sqlx_error;
use crate::rows::{
    CampaignRow, CostRow, MappingRow, OverrideRow, CAMPAIGN_COLUMNS, COST_COLUMNS, MAPPING_COLUMNS,
    OVERRIDE_COLUMNS,
};

const LOCK_CAMPAIGN: &str = "SELECT pg_advisory_xact_lock($1)";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Run one store operation with query counters, latency, and error mapping.
async fn instrumented<T, F>(op: &'static str, fut: F) -> Result<T>
where
    F: Future<Output = std::result::Result<T, sqlx::Error>>,
{
    let m = metrics();
    m.classification_queries.inc();
    let start = Instant::now();
    let result = fut.await;
    m.classification_latency_ms.observe_since(start);

    match result {
        Ok(value) => {
            health().postgres.set_healthy();
            Ok(value)
        }
        Err(e) => {
            m.classification_query_errors.inc();
            Err(map_sqlx_error(op, e))
        }
    }
}

fn campaigns_from_rows(rows: Vec<CampaignRow>) -> Result<Vec<Campaign>> {
    rows.into_iter().map(Campaign::try_from).collect()
}

fn costs_from_rows(rows: Vec<CostRow>) -> Result<Vec<CostOverride>> {
    rows.into_iter().map(CostOverride::try_from).collect()
}

#[async_trait]
impl ClassificationStore for PgStore {
    async fn get_base(&self, campaign_id: CampaignId) -> Result<ClassificationMapping> {
        let sql = format!(
            "SELECT {} FROM classification_mappings WHERE campaign_id = $1",
            MAPPING_COLUMNS
        );
        let row = instrumented(
            "get_base",
            sqlx::query_as::<_, MappingRow>(&sql)
                .bind(campaign_id)
                .fetch_optional(&self.pool),
        )
        .await?;

        row.map(ClassificationMapping::from)
            .ok_or_else(|| Error::classification_not_found(campaign_id))
    }

    async fn get_bases(
        &self,
        campaign_ids: &[CampaignId],
    ) -> Result<HashMap<CampaignId, ClassificationMapping>> {
        if campaign_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let sql = format!(
            "SELECT {} FROM classification_mappings WHERE campaign_id = ANY($1)",
            MAPPING_COLUMNS
        );
        let rows = instrumented(
            "get_bases",
            sqlx::query_as::<_, MappingRow>(&sql)
                .bind(campaign_ids)
                .fetch_all(&self.pool),
        )
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| (row.campaign_id, ClassificationMapping::from(row)))
            .collect())
    }

    async fn get_active_override(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Option<ClassificationOverride>> {
        let sql = format!(
            "SELECT {} FROM classification_overrides WHERE campaign_id = $1 AND active",
            OVERRIDE_COLUMNS
        );
        let row = instrumented(
            "get_active_override",
            sqlx::query_as::<_, OverrideRow>(&sql)
                .bind(campaign_id)
                .fetch_optional(&self.pool),
        )
        .await?;
        Ok(row.map(ClassificationOverride::from))
    }

    async fn get_active_overrides(
        &self,
        campaign_ids: &[CampaignId],
    ) -> Result<HashMap<CampaignId, ClassificationOverride>> {
        if campaign_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let sql = format!(
            "SELECT {} FROM classification_overrides WHERE campaign_id = ANY($1) AND active",
            OVERRIDE_COLUMNS
        );
        let rows = instrumented(
            "get_active_overrides",
            sqlx::query_as::<_, OverrideRow>(&sql)
                .bind(campaign_ids)
                .fetch_all(&self.pool),
        )
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| (row.campaign_id, ClassificationOverride::from(row)))
            .collect())
    }

    async fn replace_active_override(&self, row: NewOverride) -> Result<ClassificationOverride> {
        let insert = format!(
            "INSERT INTO classification_overrides \
             (campaign_id, network, domain, placement, targeting, special, reason, author, active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, TRUE) \
             RETURNING {}",
            OVERRIDE_COLUMNS
        );

        let inserted = instrumented("replace_active_override", async {
            let mut tx = self.pool.begin().await?;

            sqlx::query(LOCK_CAMPAIGN)
                .bind(row.campaign_id)
                .execute(&mut *tx)
                .await?;

            let current: Option<i64> = sqlx::query_scalar(
                "SELECT id FROM classification_overrides WHERE campaign_id = $1 AND active",
            )
            .bind(row.campaign_id)
            .fetch_optional(&mut *tx)
            .await?;
            if current != row.expected_active {
                debug!(
                    campaign_id = row.campaign_id,
                    expected = ?row.expected_active,
                    current = ?current,
                    "stale override write"
                );
                return Ok::<_, sqlx::Error>(None);
            }

            let deactivated = sqlx::query(
                "UPDATE classification_overrides \
                 SET active = FALSE, deactivated_at = now(), deactivated_by = $2 \
                 WHERE campaign_id = $1 AND active",
            )
            .bind(row.campaign_id)
            .bind(row.author.as_str())
            .execute(&mut *tx)
            .await?
            .rows_affected();

            let inserted = sqlx::query_as::<_, OverrideRow>(&insert)
                .bind(row.campaign_id)
                .bind(row.fields.network.as_deref())
                .bind(row.fields.domain.as_deref())
                .bind(row.fields.placement.as_deref())
                .bind(row.fields.targeting.as_deref())
                .bind(row.fields.special.as_deref())
                .bind(row.reason.as_deref())
                .bind(row.author.as_str())
                .fetch_one(&mut *tx)
                .await?;

            tx.commit().await?;
            debug!(campaign_id = row.campaign_id, deactivated, "override replaced");
            Ok(Some(inserted))
        })
        .await?;

        inserted
            .map(ClassificationOverride::from)
            .ok_or_else(|| Error::stale_override(row.campaign_id))
    }

    async fn deactivate(&self, campaign_id: CampaignId, deactivated_by: &str) -> Result<u64> {
        instrumented("deactivate", async {
            let mut tx = self.pool.begin().await?;

            sqlx::query(LOCK_CAMPAIGN)
                .bind(campaign_id)
                .execute(&mut *tx)
                .await?;

            let affected = sqlx::query(
                "UPDATE classification_overrides \
                 SET active = FALSE, deactivated_at = now(), deactivated_by = $2 \
                 WHERE campaign_id = $1 AND active",
            )
            .bind(campaign_id)
            .bind(deactivated_by)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            tx.commit().await?;
            Ok::<_, sqlx::Error>(affected)
        })
        .await
    }

    async fn list_history(
        &self,
        campaign_id: CampaignId,
        limit: usize,
    ) -> Result<Vec<ClassificationOverride>> {
        let sql = format!(
            "SELECT {} FROM classification_overrides WHERE campaign_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2",
            OVERRIDE_COLUMNS
        );
        let rows = instrumented(
            "list_history",
            sqlx::query_as::<_, OverrideRow>(&sql)
                .bind(campaign_id)
                .bind(i64::try_from(limit).unwrap_or(i64::MAX))
                .fetch_all(&self.pool),
        )
        .await?;

        Ok(rows.into_iter().map(ClassificationOverride::from).collect())
    }
}

#[async_trait]
impl CampaignStore for PgStore {
    async fn get_campaign(&self, campaign_id: CampaignId) -> Result<Campaign> {
        let sql = format!("SELECT {} FROM campaigns WHERE id = $1", CAMPAIGN_COLUMNS);
        let row = instrumented(
            "get_campaign",
            sqlx::query_as::<_, CampaignRow>(&sql)
                .bind(campaign_id)
                .fetch_optional(&self.pool),
        )
        .await?;

        row.ok_or_else(|| Error::campaign_not_found(campaign_id))?
            .try_into()
    }

    async fn get_campaigns(&self, campaign_ids: &[CampaignId]) -> Result<HashMap<CampaignId, Campaign>> {
        if campaign_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let sql = format!("SELECT {} FROM campaigns WHERE id = ANY($1)", CAMPAIGN_COLUMNS);
        let rows = instrumented(
            "get_campaigns",
            sqlx::query_as::<_, CampaignRow>(&sql)
                .bind(campaign_ids)
                .fetch_all(&self.pool),
        )
        .await?;

        Ok(campaigns_from_rows(rows)?
            .into_iter()
            .map(|c| (c.id, c))
            .collect())
    }

    async fn list_campaigns(&self) -> Result<Vec<Campaign>> {
        let sql = format!("SELECT {} FROM campaigns ORDER BY id", CAMPAIGN_COLUMNS);
        let rows = instrumented(
            "list_campaigns",
            sqlx::query_as::<_, CampaignRow>(&sql).fetch_all(&self.pool),
        )
        .await?;
        campaigns_from_rows(rows)
    }

    async fn replace_active_cost(&self, row: NewCostOverride) -> Result<CostOverride> {
        let insert = format!(
            "INSERT INTO campaign_cost_overrides \
             (campaign_id, cost, cost_status, start_date, end_date, reason, author, active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE) \
             RETURNING {}",
            COST_COLUMNS
        );

        let inserted = instrumented("replace_active_cost", async {
            let mut tx = self.pool.begin().await?;

            sqlx::query(LOCK_CAMPAIGN)
                .bind(row.campaign_id)
                .execute(&mut *tx)
                .await?;

            sqlx::query(
                "UPDATE campaign_cost_overrides \
                 SET active = FALSE, deactivated_at = now(), deactivated_by = $2 \
                 WHERE campaign_id = $1 AND active",
            )
            .bind(row.campaign_id)
            .bind(row.author.as_str())
            .execute(&mut *tx)
            .await?;

            let inserted = sqlx::query_as::<_, CostRow>(&insert)
                .bind(row.campaign_id)
                .bind(row.update.cost)
                .bind(row.update.cost_status.as_str())
                .bind(row.update.start_date)
                .bind(row.update.end_date)
                .bind(row.reason.as_deref())
                .bind(row.author.as_str())
                .fetch_one(&mut *tx)
                .await?;

            tx.commit().await?;
            Ok::<_, sqlx::Error>(inserted)
        })
        .await?;

        inserted.try_into()
    }

    async fn get_active_costs(
        &self,
        campaign_ids: &[CampaignId],
    ) -> Result<HashMap<CampaignId, CostOverride>> {
        if campaign_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let sql = format!(
            "SELECT {} FROM campaign_cost_overrides WHERE campaign_id = ANY($1) AND active",
            COST_COLUMNS
        );
        let rows = instrumented(
            "get_active_costs",
            sqlx::query_as::<_, CostRow>(&sql)
                .bind(campaign_ids)
                .fetch_all(&self.pool),
        )
        .await?;

        Ok(costs_from_rows(rows)?
            .into_iter()
            .map(|c| (c.campaign_id, c))
            .collect())
    }

    async fn list_cost_history(&self, campaign_id: CampaignId, limit: usize) -> Result<Vec<CostOverride>> {
        let sql = format!(
            "SELECT {} FROM campaign_cost_overrides WHERE campaign_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2",
            COST_COLUMNS
        );
        let rows = instrumented(
            "list_cost_history",
            sqlx::query_as::<_, CostRow>(&sql)
                .bind(campaign_id)
                .bind(i64::try_from(limit).unwrap_or(i64::MAX))
                .fetch_all(&self.pool),
        )
        .await?;
        costs_from_rows(rows)
    }

    async fn update_status(&self, campaign_id: CampaignId, status: CampaignStatus) -> Result<Campaign> {
        let sql = format!(
            "UPDATE campaigns SET status = $2, updated_at = now() WHERE id = $1 RETURNING {}",
            CAMPAIGN_COLUMNS
        );
        let row = instrumented(
            "update_status",
            sqlx::query_as::<_, CampaignRow>(&sql)
                .bind(campaign_id)
                .bind(status.as_str())
                .fetch_optional(&self.pool),
        )
        .await?;

        row.ok_or_else(|| Error::campaign_not_found(campaign_id))?
            .try_into()
    }
}
