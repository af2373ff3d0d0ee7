//! Wallet Settlement service entry point.
//!
//! ```text
//! ┌──────────┐    ┌──────────┐    ┌───────────┐    ┌──────────┐
//! │ Gateway  │───▶│  Ledger  │───▶│  Worker   │───▶│ Provider │
//! │ (axum)   │    │(Postgres)│    │(poll loop)│    │ (HTTP)   │
//! └──────────┘    └──────────┘    └───────────┘    └──────────┘
//! ```
//!
//! The gateway writes PENDING withdrawals; the worker polls for due ones
//! and drives them to SUCCESS or FAILED through the settlement provider.

use std::sync::Arc;

use anyhow::Context;

use wallet_settlement::config::AppConfig;
use wallet_settlement::db::Database;
use wallet_settlement::gateway;
use wallet_settlement::logging::init_logging;
use wallet_settlement::provider::HttpSettlementProvider;
use wallet_settlement::worker::{SettlementWorker, WorkerConfig};

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    std::env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let config = AppConfig::load(&env);
    let _guard = init_logging(&config);

    tracing::info!(env, "starting wallet settlement service");

    // DATABASE_URL wins over the config file, for container deployments.
    let database_url = std::env::var("DATABASE_URL")
        .ok()
        .or_else(|| config.postgres_url.clone())
        .context("no database url: set DATABASE_URL or postgres_url in config")?;

    let db = Database::connect(&database_url, &config.db)
        .await
        .context("failed to connect to PostgreSQL")?;

    sqlx::migrate!("./migrations")
        .run(db.pool())
        .await
        .context("failed to run migrations")?;
    tracing::info!("migrations applied");

    let provider = Arc::new(
        HttpSettlementProvider::new(&config.provider)
            .context("failed to build settlement provider client")?,
    );

    let worker = SettlementWorker::new(
        db.pool().clone(),
        provider,
        WorkerConfig::from(&config.worker),
    );
    tokio::spawn(async move {
        worker.run().await;
    });
    tracing::info!(
        poll_interval_secs = config.worker.poll_interval_secs,
        "settlement worker started"
    );

    gateway::serve(&config.gateway, db).await
}
