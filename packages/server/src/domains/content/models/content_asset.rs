//! Content asset model - secondary record linked to a content item.
//!
//! An asset (e.g., the media attachment rendered with a post) mirrors the
//! publish outcome of its owning item so both records show "published" with
//! the same external post id.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use typed_builder::TypedBuilder;
use uuid::Uuid;

#[derive(FromRow, Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct ContentAsset {
    #[builder(default = Uuid::new_v4())]
    pub id: Uuid,

    pub account_id: Uuid,

    /// Asset kind, e.g., 'image', 'carousel', 'video'.
    pub kind: String,

    #[builder(default, setter(strip_option))]
    pub external_post_id: Option<String>,
    #[builder(default, setter(strip_option))]
    pub published_at: Option<DateTime<Utc>>,

    #[builder(default = Utc::now())]
    pub created_at: DateTime<Utc>,
    #[builder(default = Utc::now())]
    pub updated_at: DateTime<Utc>,
}

impl ContentAsset {
    pub async fn insert(&self, pool: &PgPool) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO content_assets (
                id, account_id, kind, external_post_id, published_at,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(self.id)
        .bind(self.account_id)
        .bind(&self.kind)
        .bind(&self.external_post_id)
        .bind(self.published_at)
        .bind(self.created_at)
        .bind(self.updated_at)
        .execute(pool)
        .await?;

        Ok(())
    }

    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> Result<Self> {
        let asset = sqlx::query_as::<_, Self>("SELECT * FROM content_assets WHERE id = $1")
            .bind(id)
            .fetch_one(pool)
            .await?;

        Ok(asset)
    }

    /// Propagate the publish outcome from the owning content item.
    pub async fn mark_published(
        id: Uuid,
        external_post_id: Option<&str>,
        now: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE content_assets
            SET external_post_id = $2,
                published_at = $3,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(external_post_id)
        .bind(now)
        .execute(pool)
        .await?;

        Ok(())
    }
}
