//! Webhook endpoint model - user-registered delivery targets.
//!
//! Read-only from the dispatcher's perspective; endpoints are managed by
//! their owner through the CRUD layer.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use typed_builder::TypedBuilder;
use uuid::Uuid;

#[derive(FromRow, Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct WebhookEndpoint {
    #[builder(default = Uuid::new_v4())]
    pub id: Uuid,

    pub account_id: Uuid,

    pub url: String,
    pub name: String,

    #[builder(default = true)]
    pub active: bool,

    #[builder(default = Utc::now())]
    pub created_at: DateTime<Utc>,
    #[builder(default = Utc::now())]
    pub updated_at: DateTime<Utc>,
}

impl WebhookEndpoint {
    pub async fn insert(&self, pool: &PgPool) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO webhook_endpoints (
                id, account_id, url, name, active, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(self.id)
        .bind(self.account_id)
        .bind(&self.url)
        .bind(&self.name)
        .bind(self.active)
        .bind(self.created_at)
        .bind(self.updated_at)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Active endpoints registered by an account.
    pub async fn find_active_for_account(account_id: Uuid, pool: &PgPool) -> Result<Vec<Self>> {
        let endpoints = sqlx::query_as::<_, Self>(
            r#"
            SELECT *
            FROM webhook_endpoints
            WHERE account_id = $1 AND active = true
            ORDER BY created_at
            "#,
        )
        .bind(account_id)
        .fetch_all(pool)
        .await?;

        Ok(endpoints)
    }
}
