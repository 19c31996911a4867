//! Content item model - the unit of work for the publish scheduler.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use typed_builder::TypedBuilder;
use uuid::Uuid;

use crate::kernel::PublishReceipt;

// ============================================================================
// Enums
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "content_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ContentStatus {
    #[default]
    Draft,
    Approved,
    Scheduled,
    Published,
    Failed,
}

// ============================================================================
// ContentItem Model
// ============================================================================

/// A content item moving through the publishing lifecycle.
///
/// Lifecycle: `draft → approved → scheduled → published | failed`. The
/// scheduler owns the transition out of `scheduled` via an atomic claim;
/// while claimed, the row sits in `approved` with `claimed_at` set.
/// Invariant: `external_post_id` is set iff the item was published through
/// `publish_provider`.
#[derive(FromRow, Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct ContentItem {
    #[builder(default = Uuid::new_v4())]
    pub id: Uuid,

    pub account_id: Uuid,

    #[builder(default)]
    pub status: ContentStatus,

    // Content
    #[builder(default, setter(strip_option))]
    pub draft_content: Option<String>,
    /// Operator-edited content; wins over the draft when resolving.
    #[builder(default, setter(strip_option))]
    pub edited_content: Option<String>,

    // Scheduling
    #[builder(default, setter(strip_option))]
    pub scheduled_at: Option<DateTime<Utc>>,
    /// Soft deadline after which an approved item is scheduled automatically.
    #[builder(default, setter(strip_option))]
    pub auto_publish_after: Option<DateTime<Utc>>,

    // Publish outcome
    #[builder(default, setter(strip_option))]
    pub external_post_id: Option<String>,
    #[builder(default, setter(strip_option))]
    pub publish_provider: Option<String>,
    #[builder(default, setter(strip_option))]
    pub published_at: Option<DateTime<Utc>>,
    #[builder(default, setter(strip_option))]
    pub last_error: Option<String>,

    /// Set while a tick holds the claim on this item; stuck claims older
    /// than the claim timeout are reverted by a later tick.
    #[builder(default, setter(strip_option))]
    pub claimed_at: Option<DateTime<Utc>>,

    /// Linked secondary record that mirrors the publish outcome.
    #[builder(default, setter(strip_option))]
    pub asset_id: Option<Uuid>,

    #[builder(default = Utc::now())]
    pub created_at: DateTime<Utc>,
    #[builder(default = Utc::now())]
    pub updated_at: DateTime<Utc>,
}

impl ContentItem {
    /// Insert this item into the database
    pub async fn insert(&self, pool: &PgPool) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO content_items (
                id, account_id, status, draft_content, edited_content,
                scheduled_at, auto_publish_after, external_post_id,
                publish_provider, published_at, last_error, claimed_at,
                asset_id, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(self.id)
        .bind(self.account_id)
        .bind(self.status)
        .bind(&self.draft_content)
        .bind(&self.edited_content)
        .bind(self.scheduled_at)
        .bind(self.auto_publish_after)
        .bind(&self.external_post_id)
        .bind(&self.publish_provider)
        .bind(self.published_at)
        .bind(&self.last_error)
        .bind(self.claimed_at)
        .bind(self.asset_id)
        .bind(self.created_at)
        .bind(self.updated_at)
        .execute(pool)
        .await?;

        Ok(())
    }

    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> Result<Self> {
        let item = sqlx::query_as::<_, Self>("SELECT * FROM content_items WHERE id = $1")
            .bind(id)
            .fetch_one(pool)
            .await?;

        Ok(item)
    }

    /// Revert claims abandoned by a crashed tick back to `scheduled`.
    ///
    /// A claim is just `approved` + `claimed_at`; anything older than the
    /// timeout was never resolved and is safe to offer to the next tick.
    pub async fn reclaim_stuck(
        now: DateTime<Utc>,
        claim_timeout: Duration,
        pool: &PgPool,
    ) -> Result<u64> {
        let cutoff = now - claim_timeout;

        let result = sqlx::query(
            r#"
            UPDATE content_items
            SET status = 'scheduled',
                claimed_at = NULL,
                updated_at = NOW()
            WHERE status = 'approved'
              AND claimed_at IS NOT NULL
              AND claimed_at < $1
            "#,
        )
        .bind(cutoff)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Step A: schedule approved items whose auto-publish deadline elapsed.
    ///
    /// Batched with a bounded limit so one tick cannot run unbounded; items
    /// past the limit are picked up next tick. Claimed rows (`claimed_at`
    /// set) are a different thing entirely and are excluded.
    pub async fn auto_approve_due(
        now: DateTime<Utc>,
        limit: i64,
        pool: &PgPool,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            WITH due AS (
                SELECT id
                FROM content_items
                WHERE status = 'approved'
                  AND claimed_at IS NULL
                  AND auto_publish_after IS NOT NULL
                  AND auto_publish_after <= $1
                ORDER BY auto_publish_after
                LIMIT $2
                FOR UPDATE SKIP LOCKED
            )
            UPDATE content_items
            SET status = 'scheduled',
                scheduled_at = $1,
                updated_at = NOW()
            WHERE id IN (SELECT id FROM due)
            "#,
        )
        .bind(now)
        .bind(limit)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Step B candidates: scheduled items whose publish time has elapsed.
    pub async fn find_publish_due(
        now: DateTime<Utc>,
        limit: i64,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let items = sqlx::query_as::<_, Self>(
            r#"
            SELECT *
            FROM content_items
            WHERE status = 'scheduled'
              AND scheduled_at IS NOT NULL
              AND scheduled_at <= $1
            ORDER BY scheduled_at
            LIMIT $2
            "#,
        )
        .bind(now)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(items)
    }

    /// Atomically claim this item for publishing.
    ///
    /// Single conditional update, the only concurrency mechanism in the
    /// pipeline: zero rows affected means another tick already claimed the
    /// row, and the caller skips it without error.
    pub async fn claim(id: Uuid, now: DateTime<Utc>, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE content_items
            SET status = 'approved',
                claimed_at = $2,
                updated_at = NOW()
            WHERE id = $1 AND status = 'scheduled'
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Give a claim back, leaving the item publishable by a later tick.
    pub async fn revert_claim(id: Uuid, pool: &PgPool) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE content_items
            SET status = 'scheduled',
                claimed_at = NULL,
                updated_at = NOW()
            WHERE id = $1 AND status = 'approved'
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Record a successful publish (external or local).
    pub async fn mark_published(
        id: Uuid,
        receipt: &PublishReceipt,
        now: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE content_items
            SET status = 'published',
                external_post_id = $2,
                publish_provider = $3,
                published_at = $4,
                claimed_at = NULL,
                last_error = NULL,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&receipt.post_id)
        .bind(&receipt.provider)
        .bind(now)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Record a publisher failure; the item stays `failed` until an operator
    /// retries it explicitly.
    pub async fn mark_failed(id: Uuid, error: &str, pool: &PgPool) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE content_items
            SET status = 'failed',
                last_error = $2,
                claimed_at = NULL,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(error)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Operator-triggered retry of a failed item: back to `scheduled` with
    /// the error cleared, publishable on the next tick.
    pub async fn retry(id: Uuid, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE content_items
            SET status = 'scheduled',
                scheduled_at = COALESCE(scheduled_at, NOW()),
                last_error = NULL,
                updated_at = NOW()
            WHERE id = $1 AND status = 'failed'
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Resolve the final content to publish: explicit edited content wins
    /// over the original draft. Blank strings resolve to nothing.
    pub fn resolved_content(&self) -> Option<&str> {
        self.edited_content
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .or_else(|| {
                self.draft_content
                    .as_deref()
                    .filter(|c| !c.trim().is_empty())
            })
    }
}
