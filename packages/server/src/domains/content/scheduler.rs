//! Publish scheduler - advances content items through the publishing
//! lifecycle on a fixed cadence.
//!
//! One tick is idempotent and safe under overlap with a concurrent tick:
//! every item is claimed with a single conditional update before any
//! external call, so two ticks racing over the same rows never both publish
//! the same item. No row locks are held across network calls.
//!
//! ```text
//! run_tick(now)
//!     ├─► revert claims abandoned by a crashed tick
//!     ├─► Step A: approved + deadline elapsed → scheduled
//!     └─► Step B: scheduled + time elapsed
//!             ├─► claim (conditional update; lost claim = silent skip)
//!             ├─► resolve content (edited wins; none → revert claim)
//!             └─► publish via the owner's publisher, or locally when the
//!                 owner has none configured
//! ```

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};

use crate::kernel::{PublishReceipt, ServerDeps};

use super::models::{ContentAsset, ContentItem};

/// Per-tick cap on items handled in each step; bounds tick duration.
pub const TICK_BATCH_SIZE: i64 = 20;

/// Claims older than this were abandoned by a crashed tick and are reverted.
pub const CLAIM_TIMEOUT_MINUTES: i64 = 10;

/// Provider recorded when an owner has no publishing integration and the
/// item is published in-app only.
pub const LOCAL_PROVIDER: &str = "local";

/// What one scheduler tick accomplished.
#[derive(Debug, Default)]
pub struct TickOutcome {
    pub auto_approved: u64,
    pub published: u64,
    pub errors: Vec<String>,
}

/// Run one scheduler tick against the item store.
///
/// Returns `Err` only on storage failures; per-item publish failures are
/// recorded on the item and surfaced in `TickOutcome::errors`.
pub async fn run_tick(deps: &ServerDeps, now: DateTime<Utc>) -> Result<TickOutcome> {
    let pool = &deps.db_pool;
    let mut outcome = TickOutcome::default();

    // Recover claims left behind by a tick that died mid-publish.
    let reclaimed =
        ContentItem::reclaim_stuck(now, Duration::minutes(CLAIM_TIMEOUT_MINUTES), pool).await?;
    if reclaimed > 0 {
        tracing::warn!(reclaimed, "Reverted stuck publish claims");
    }

    // Step A: auto-approve items past their soft deadline.
    outcome.auto_approved = ContentItem::auto_approve_due(now, TICK_BATCH_SIZE, pool).await?;
    if outcome.auto_approved > 0 {
        tracing::info!(
            count = outcome.auto_approved,
            "Auto-scheduled items past their publish deadline"
        );
    }

    // Step B: claim and publish due items.
    let due = ContentItem::find_publish_due(now, TICK_BATCH_SIZE, pool).await?;
    for item in due {
        if !ContentItem::claim(item.id, now, pool).await? {
            // Another tick got here first - expected under overlap, not an error.
            tracing::debug!(item_id = %item.id, "Publish claim lost, skipping");
            continue;
        }

        let Some(content) = item.resolved_content().map(str::to_string) else {
            // Data-integrity problem; leave the item schedulable so an
            // operator can fix the content without a status reset.
            ContentItem::revert_claim(item.id, pool).await?;
            outcome
                .errors
                .push(format!("item {} has no resolvable content", item.id));
            continue;
        };

        let publisher = match deps.publishers.resolve(item.account_id).await {
            Ok(publisher) => publisher,
            Err(e) => {
                ContentItem::revert_claim(item.id, pool).await?;
                outcome
                    .errors
                    .push(format!("resolving publisher for item {}: {}", item.id, e));
                continue;
            }
        };

        let receipt = match publisher {
            // No integration configured: valid state, publish in-app only.
            None => PublishReceipt {
                post_id: None,
                provider: LOCAL_PROVIDER.to_string(),
            },
            Some(publisher) => match publisher.publish(&content).await {
                Ok(receipt) => receipt,
                Err(e) => {
                    ContentItem::mark_failed(item.id, &e.to_string(), pool).await?;
                    outcome
                        .errors
                        .push(format!("publish failed for item {}: {}", item.id, e));
                    tracing::warn!(item_id = %item.id, error = %e, "Publish failed");
                    continue;
                }
            },
        };

        ContentItem::mark_published(item.id, &receipt, now, pool).await?;

        // The linked asset record mirrors the publish outcome.
        if let Some(asset_id) = item.asset_id {
            ContentAsset::mark_published(asset_id, receipt.post_id.as_deref(), now, pool).await?;
        }

        outcome.published += 1;
        tracing::info!(
            item_id = %item.id,
            provider = %receipt.provider,
            external_post_id = receipt.post_id.as_deref().unwrap_or("-"),
            "Published content item"
        );
    }

    Ok(outcome)
}
