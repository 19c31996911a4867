//! Scheduled background tasks using tokio-cron-scheduler.
//!
//! This module wires the publish scheduler to its cron trigger:
//! - Publish tick every 5 minutes
//!
//! # Architecture
//!
//! The tick itself lives in `domains::content::scheduler`; this module only
//! owns cadence and error logging. Overlapping ticks are safe because the
//! scheduler claims items with a conditional update, so a slow tick that
//! runs into the next one cannot double-publish.
//!
//! ```text
//! Cron (every 5 minutes)
//!     │
//!     └─► run_tick(now)
//!             ├─► auto-approve items past their deadline
//!             └─► claim + publish due items
//! ```

use anyhow::Result;
use chrono::Utc;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::domains::content::scheduler::run_tick;
use crate::kernel::ServerDeps;

/// Start all scheduled tasks
pub async fn start_scheduler(deps: ServerDeps) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    // Publish tick - runs every 5 minutes
    let tick_deps = deps.clone();
    let publish_job = Job::new_async("0 */5 * * * *", move |_uuid, _lock| {
        let deps = tick_deps.clone();
        Box::pin(async move {
            match run_tick(&deps, Utc::now()).await {
                Ok(outcome) => {
                    if outcome.auto_approved > 0
                        || outcome.published > 0
                        || !outcome.errors.is_empty()
                    {
                        tracing::info!(
                            auto_approved = outcome.auto_approved,
                            published = outcome.published,
                            errors = outcome.errors.len(),
                            "Publish tick complete"
                        );
                    }
                    for error in &outcome.errors {
                        tracing::warn!("Publish tick error: {}", error);
                    }
                }
                Err(e) => {
                    tracing::error!("Publish tick failed: {}", e);
                }
            }
        })
    })?;

    scheduler.add(publish_job).await?;
    scheduler.start().await?;

    tracing::info!("Scheduled tasks started (publish tick every 5 minutes)");
    Ok(scheduler)
}
