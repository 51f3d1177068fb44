//! RankIt server — application entry point.
//!
//! Connects to SurrealDB, applies migrations, and runs the periodic
//! reconciliation sweep until interrupted.

use std::time::Duration;

use rankit_db::repository::{SurrealItemRepository, SurrealRatingRepository};
use rankit_db::{DbManager, run_migrations};
use rankit_engine::{EngineConfig, Reconciler};
use tracing_subscriber::EnvFilter;

mod config;

use config::ServerConfig;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("rankit=info".parse().unwrap()),
        )
        .json()
        .init();

    tracing::info!("Starting RankIt server...");

    let config = ServerConfig::load();

    let manager = match DbManager::connect(&config.db).await {
        Ok(m) => m,
        Err(e) => {
            tracing::error!(error = %e, "failed to connect to SurrealDB");
            std::process::exit(1);
        }
    };

    if let Err(e) = run_migrations(manager.client()).await {
        tracing::error!(error = %e, "failed to apply migrations");
        std::process::exit(1);
    }

    let engine_config = EngineConfig::default();
    let reconciler = Reconciler::new(
        SurrealItemRepository::new(manager.client().clone()),
        SurrealRatingRepository::new(manager.client().clone()),
        engine_config.reconcile_page_size,
    );

    let interval_secs = config.reconcile_interval_secs;
    let sweep_task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
        loop {
            interval.tick().await;
            match reconciler.sweep().await {
                Ok(0) => {}
                Ok(repaired) => {
                    tracing::info!(repaired, "reconciliation sweep repaired items");
                }
                Err(e) => {
                    tracing::error!(error = %e, "reconciliation sweep failed");
                }
            }
        }
    });

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }

    sweep_task.abort();
    tracing::info!("RankIt server stopped.");
}
