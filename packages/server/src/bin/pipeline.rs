//! Publishing pipeline entrypoint.
//!
//! Connects to Postgres, runs migrations, and starts the cron-driven
//! publish scheduler. The automation engine and webhook dispatcher are
//! invoked per-event by their callers and need no standing task here.

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;

use pipeline_core::config::Config;
use pipeline_core::kernel::scheduled_tasks::start_scheduler;
use pipeline_core::kernel::ServerDeps;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;

    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .context("Failed to run migrations")?;

    let deps = ServerDeps::production(db_pool, &config);
    let mut scheduler = start_scheduler(deps).await?;

    tracing::info!("Publishing pipeline running; press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;

    scheduler.shutdown().await?;
    tracing::info!("Publishing pipeline stopped");

    Ok(())
}
