//! Maintenance worker: sweeps generations stuck in a non-terminal status.
//!
//! A dispatcher crash leaves its in-progress record behind on purpose so the
//! attempt stays inspectable. This binary periodically marks such records
//! failed once they have sat untouched past the configured age, keeping the
//! audit trail honest without deleting anything.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reelforge_db::repositories::GenerationRepo;
use reelforge_pipeline::PipelineConfig;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reelforge_worker=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = PipelineConfig::from_env();
    tracing::info!(
        sweep_interval_secs = config.sweep_interval_secs,
        stuck_after_secs = config.stuck_after_secs,
        "Loaded worker configuration",
    );

    // --- Database ---
    let pool = reelforge_db::create_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    reelforge_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Shutdown wiring ---
    let cancel = CancellationToken::new();
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Ctrl-C received, shutting down");
            ctrl_c_cancel.cancel();
        }
    });

    // --- Sweep loop ---
    let mut interval = tokio::time::interval(Duration::from_secs(config.sweep_interval_secs));
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {}
        }

        match GenerationRepo::sweep_stuck(&pool, config.stuck_after_secs).await {
            Ok(swept) if swept.is_empty() => {
                tracing::debug!("Sweep found no stuck generations");
            }
            Ok(swept) => {
                tracing::warn!(count = swept.len(), ids = ?swept, "Swept stuck generations");
            }
            Err(e) => {
                tracing::error!(error = %e, "Sweep query failed");
            }
        }
    }

    tracing::info!("Worker stopped");
}
