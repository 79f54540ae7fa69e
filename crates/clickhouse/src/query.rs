//! Grouped SUM queries over the hourly fact table.

use crate::client::ClickHouseClient;
use crate::schema::FACTS_TABLE;
use async_trait::async_trait;
use clickhouse::query::Query;
use clickhouse::Row;
use dashboard_core::{
    CampaignId, Error, FactRepository, Granularity, HourRange, PeriodCounters, RawCounters, Result,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Instant;
use telemetry::{health, metrics};
use tracing::{debug, error};

const SUM_COLUMNS: &str = "sum(sessions) AS sessions, \
    sum(registrations) AS registrations, \
    sum(messages) AS messages, \
    sum(converted_users) AS converted_users, \
    sum(total_accounts) AS total_accounts, \
    sum(credit_cards) AS credit_cards, \
    sum(email_accounts) AS email_accounts, \
    sum(google_accounts) AS google_accounts, \
    sum(payment_methods) AS payment_methods";

/// One grouped SUM result. `key` is a campaign id or a period start.
#[derive(Debug, Clone, Row, Deserialize)]
struct SumRow {
    key: i64,
    sessions: u64,
    registrations: u64,
    messages: u64,
    converted_users: u64,
    total_accounts: u64,
    credit_cards: u64,
    email_accounts: u64,
    google_accounts: u64,
    payment_methods: u64,
}

impl From<&SumRow> for RawCounters {
    fn from(row: &SumRow) -> Self {
        RawCounters {
            sessions: row.sessions,
            registrations: row.registrations,
            messages: row.messages,
            converted_users: row.converted_users,
            total_accounts: row.total_accounts,
            credit_cards: row.credit_cards,
            email_accounts: row.email_accounts,
            google_accounts: row.google_accounts,
            payment_methods: row.payment_methods,
        }
    }
}

/// Campaign and hour-range predicate shared by every fact query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FactFilter {
    pub campaign_ids: Option<Vec<CampaignId>>,
    pub from_hour: Option<i64>,
    pub to_hour: Option<i64>,
}

impl FactFilter {
    pub fn new(campaign_ids: Option<&[CampaignId]>, range: &HourRange) -> Self {
        Self {
            campaign_ids: campaign_ids.map(<[CampaignId]>::to_vec),
            from_hour: range.from_hour,
            to_hour: range.to_hour,
        }
    }

    /// True when an explicit, empty campaign set was requested.
    pub fn matches_nothing(&self) -> bool {
        self.campaign_ids.as_ref().is_some_and(Vec::is_empty)
    }

    /// WHERE clause with one `?` placeholder per bound value, in bind order.
    pub fn where_clause(&self) -> String {
        let mut predicates = Vec::new();
        if self.campaign_ids.is_some() {
            predicates.push("has(?, campaign_id)");
        }
        if self.from_hour.is_some() {
            predicates.push("unix_hour >= ?");
        }
        if self.to_hour.is_some() {
            predicates.push("unix_hour <= ?");
        }

        if predicates.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", predicates.join(" AND "))
        }
    }

    fn bind(&self, mut query: Query) -> Query {
        if let Some(ref ids) = self.campaign_ids {
            query = query.bind(ids.as_slice());
        }
        if let Some(from) = self.from_hour {
            query = query.bind(from);
        }
        if let Some(to) = self.to_hour {
            query = query.bind(to);
        }
        query
    }
}

/// SQL expression yielding the period start (unix seconds, UTC) of a fact row.
pub fn period_expr(granularity: Granularity) -> &'static str {
    match granularity {
        Granularity::Hour => "unix_hour * 3600",
        Granularity::Day => {
            "toInt64(toUnixTimestamp(toStartOfDay(toDateTime(unix_hour * 3600, 'UTC'))))"
        }
        Granularity::Week => {
            "toInt64(toUnixTimestamp(toDateTime(toMonday(toDateTime(unix_hour * 3600, 'UTC')), 'UTC')))"
        }
        Granularity::Month => {
            "toInt64(toUnixTimestamp(toDateTime(toStartOfMonth(toDateTime(unix_hour * 3600, 'UTC')), 'UTC')))"
        }
    }
}

pub fn sum_by_campaign_sql(database: &str, filter: &FactFilter) -> String {
    format!(
        "SELECT campaign_id AS key, {sums} FROM {db}.{table} FINAL {filter} GROUP BY key ORDER BY key",
        sums = SUM_COLUMNS,
        db = database,
        table = FACTS_TABLE,
        filter = filter.where_clause(),
    )
}

pub fn sum_by_period_sql(database: &str, filter: &FactFilter, granularity: Granularity) -> String {
    format!(
        "SELECT {period} AS key, {sums} FROM {db}.{table} FINAL {filter} GROUP BY key ORDER BY key",
        period = period_expr(granularity),
        sums = SUM_COLUMNS,
        db = database,
        table = FACTS_TABLE,
        filter = filter.where_clause(),
    )
}

/// [`FactRepository`] over ClickHouse.
#[derive(Clone)]
pub struct ClickHouseFactRepository {
    client: ClickHouseClient,
}

impl ClickHouseFactRepository {
    pub fn new(client: ClickHouseClient) -> Self {
        Self { client }
    }

    async fn fetch_sums(&self, sql: String, filter: &FactFilter) -> Result<Vec<SumRow>> {
        let m = metrics();
        m.fact_queries.inc();
        let start = Instant::now();

        let query = filter.bind(self.client.inner().query(&sql));
        let result = tokio::time::timeout(self.client.timeout(), query.fetch_all::<SumRow>()).await;
        m.fact_query_latency_ms.observe_since(start);

        match result {
            Ok(Ok(rows)) => {
                health().clickhouse.set_healthy();
                debug!(rows = rows.len(), "fact query complete");
                Ok(rows)
            }
            Ok(Err(e)) => {
                m.fact_query_errors.inc();
                if matches!(e, clickhouse::error::Error::Network(_)) {
                    health().clickhouse.set_unhealthy(e.to_string());
                }
                error!(error = %e, "fact query failed");
                Err(Error::unavailable(format!("fact query failed: {}", e)))
            }
            Err(_) => {
                m.fact_query_errors.inc();
                error!(timeout_secs = self.client.config().timeout_secs, "fact query timed out");
                Err(Error::unavailable("fact query timed out"))
            }
        }
    }
}

#[async_trait]
impl FactRepository for ClickHouseFactRepository {
    async fn sum_by_campaign(
        &self,
        campaign_ids: Option<&[CampaignId]>,
        range: &HourRange,
    ) -> Result<BTreeMap<CampaignId, RawCounters>> {
        let filter = FactFilter::new(campaign_ids, range);
        if filter.matches_nothing() {
            return Ok(BTreeMap::new());
        }

        let sql = sum_by_campaign_sql(self.client.database(), &filter);
        let rows = self.fetch_sums(sql, &filter).await?;
        Ok(rows.iter().map(|row| (row.key, RawCounters::from(row))).collect())
    }

    async fn sum_grouped_by_period(
        &self,
        campaign_ids: Option<&[CampaignId]>,
        range: &HourRange,
        granularity: Granularity,
    ) -> Result<Vec<PeriodCounters>> {
        let filter = FactFilter::new(campaign_ids, range);
        if filter.matches_nothing() {
            return Ok(Vec::new());
        }

        let sql = sum_by_period_sql(self.client.database(), &filter, granularity);
        let rows = self.fetch_sums(sql, &filter).await?;
        Ok(rows
            .iter()
            .map(|row| PeriodCounters {
                period_start: row.key,
                counters: RawCounters::from(row),
            })
            .collect())
    }
}
