//! Campaign Dashboard
//!
//! Serves hierarchical campaign rollups and classification overrides:
//! - hourly fact counters read from ClickHouse
//! - campaigns, base mappings and the override audit trail in Postgres
//! - rule-based classification suggestions

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::signal;
use tracing::{error, info, warn};

use api::{router, ApiLimits, AppState};
use clickhouse_client::{ClickHouseClient, ClickHouseConfig, ClickHouseFactRepository};
use dashboard_core::{MappingRule, RuleSet};
use postgres_store::{PgStore, PostgresConfig};
use rollup_engine::Dashboard;
use sqlx::PgPool;
use telemetry::init_tracing_from_env;

const HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(30);

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Config {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,

    #[serde(default)]
    clickhouse: ClickHouseConfig,

    #[serde(default)]
    postgres: PostgresConfig,

    /// TOML file with `[[rules]]` entries; the built-in rules when absent
    #[serde(default)]
    rules_file: Option<String>,

    #[serde(default)]
    limits: ApiLimits,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            clickhouse: ClickHouseConfig::default(),
            postgres: PostgresConfig::default(),
            rules_file: None,
            limits: ApiLimits::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RulesFile {
    #[serde(default)]
    rules: Vec<MappingRule>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing_from_env();

    info!("Starting Campaign Dashboard v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;

    // ClickHouse: hourly facts
    let clickhouse = ClickHouseClient::new(config.clickhouse.clone());
    if let Err(e) = clickhouse_client::schema::init_schema(&clickhouse).await {
        error!("Failed to initialize ClickHouse schema: {}", e);
        // Continue anyway - schema might already exist
    }

    // Postgres: campaigns, mappings, overrides. The pool connects on first use.
    let pool = postgres_store::connect_lazy(&config.postgres)
        .context("Invalid Postgres configuration")?;
    if let Err(e) = postgres_store::schema::init_schema(&pool).await {
        error!("Failed to initialize Postgres schema: {}", e);
    }

    check_health(&clickhouse, &pool).await;
    let _health_monitor = spawn_health_monitor(clickhouse.clone(), pool.clone());

    let rules = load_rules(config.rules_file.as_deref())?;

    let store = Arc::new(PgStore::new(pool.clone()));
    let dashboard = Dashboard::new(
        Arc::new(ClickHouseFactRepository::new(clickhouse)),
        store.clone(),
        store,
        rules,
    );

    let app = router(AppState::with_limits(dashboard, config.limits));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid server address")?;

    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down...");
    pool.close().await;

    info!("Shutdown complete");
    Ok(())
}

/// Load configuration from files and environment.
fn load_config() -> Result<Config> {
    let config = config::Config::builder()
        // Start with defaults
        .add_source(config::Config::try_from(&Config::default())?)
        // Load from config file if exists
        .add_source(
            config::File::with_name("config/default")
                .required(false)
                .format(config::FileFormat::Toml),
        )
        // Override with environment variables
        .add_source(
            config::Environment::default()
                .separator("__")
                .prefix("DASHBOARD")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    let mut config: Config = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    // The config crate's nested parsing doesn't work reliably with
    // underscored field names, so the common ones are read directly.
    if let Ok(url) = std::env::var("DASHBOARD_CLICKHOUSE_URL") {
        config.clickhouse.url = url;
    }
    if let Ok(database) = std::env::var("DASHBOARD_CLICKHOUSE_DATABASE") {
        config.clickhouse.database = database;
    }
    if let Ok(username) = std::env::var("DASHBOARD_CLICKHOUSE_USERNAME") {
        config.clickhouse.username = Some(username);
    }
    if let Ok(password) = std::env::var("DASHBOARD_CLICKHOUSE_PASSWORD") {
        config.clickhouse.password = Some(password);
    }
    if let Ok(url) = std::env::var("DASHBOARD_POSTGRES_URL") {
        config.postgres.url = url;
    }
    if let Ok(max) = std::env::var("DASHBOARD_POSTGRES_MAX_CONNECTIONS") {
        config.postgres.max_connections = max
            .parse()
            .context("DASHBOARD_POSTGRES_MAX_CONNECTIONS must be a number")?;
    }
    if let Ok(path) = std::env::var("DASHBOARD_RULES_FILE") {
        config.rules_file = Some(path);
    }

    Ok(config)
}

/// Mapping rules from `path`, or the built-in set.
fn load_rules(path: Option<&str>) -> Result<RuleSet> {
    let Some(path) = path else {
        info!("Using built-in mapping rules");
        return Ok(RuleSet::builtin());
    };

    let file: RulesFile = config::Config::builder()
        .add_source(config::File::with_name(path).format(config::FileFormat::Toml))
        .build()
        .and_then(|c| c.try_deserialize())
        .with_context(|| format!("Failed to load mapping rules from {}", path))?;

    let rules = RuleSet::new(file.rules);
    for name in rules.invalid_rules() {
        warn!(rule = name, "Mapping rule has an invalid regex and will never match");
    }
    info!(path, rules = rules.len(), "Loaded mapping rules");
    Ok(rules)
}

/// Ping both datastores and record the outcome.
async fn check_health(clickhouse: &ClickHouseClient, pool: &PgPool) {
    if clickhouse_client::health::check_connection(clickhouse).await {
        info!("ClickHouse connection: healthy");
    } else {
        error!("ClickHouse connection: unhealthy");
    }

    if postgres_store::health::check_connection(pool).await {
        info!("Postgres connection: healthy");
    } else {
        error!("Postgres connection: unhealthy");
    }
}

/// Re-check both datastores periodically so readiness recovers after an outage.
fn spawn_health_monitor(clickhouse: ClickHouseClient, pool: PgPool) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(HEALTH_CHECK_INTERVAL);
        interval.tick().await;
        loop {
            interval.tick().await;
            clickhouse_client::health::check_connection(&clickhouse).await;
            postgres_store::health::check_connection(&pool).await;
        }
    })
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received terminate signal");
        }
    }
}
