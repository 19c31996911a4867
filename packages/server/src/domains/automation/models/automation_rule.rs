//! Automation rule model - a keyword-triggered action set watching one
//! post's comments.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use typed_builder::TypedBuilder;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "automation_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RuleStatus {
    #[default]
    Draft,
    Running,
    Paused,
}

/// A user-configured automation. The engine only ever mutates
/// `leads_captured`; everything else belongs to the owner.
#[derive(FromRow, Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct AutomationRule {
    #[builder(default = Uuid::new_v4())]
    pub id: Uuid,

    pub account_id: Uuid,

    /// External id of the post whose comments are watched.
    pub post_id: String,

    #[builder(default)]
    pub keywords: Vec<String>,

    #[builder(default)]
    pub status: RuleStatus,

    // Independently enabled actions
    #[builder(default)]
    pub auto_like: bool,
    #[builder(default, setter(strip_option))]
    pub reply_template: Option<String>,
    #[builder(default, setter(strip_option))]
    pub campaign_id: Option<String>,
    /// Static custom variables passed through on campaign enrollment.
    #[builder(default = serde_json::json!({}))]
    pub custom_variables: serde_json::Value,

    #[builder(default)]
    pub leads_captured: i32,

    #[builder(default = Utc::now())]
    pub created_at: DateTime<Utc>,
    #[builder(default = Utc::now())]
    pub updated_at: DateTime<Utc>,
}

impl AutomationRule {
    pub async fn insert(&self, pool: &PgPool) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO automation_rules (
                id, account_id, post_id, keywords, status, auto_like,
                reply_template, campaign_id, custom_variables, leads_captured,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(self.id)
        .bind(self.account_id)
        .bind(&self.post_id)
        .bind(&self.keywords)
        .bind(self.status)
        .bind(self.auto_like)
        .bind(&self.reply_template)
        .bind(&self.campaign_id)
        .bind(&self.custom_variables)
        .bind(self.leads_captured)
        .bind(self.created_at)
        .bind(self.updated_at)
        .execute(pool)
        .await?;

        Ok(())
    }

    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> Result<Self> {
        let rule = sqlx::query_as::<_, Self>("SELECT * FROM automation_rules WHERE id = $1")
            .bind(id)
            .fetch_one(pool)
            .await?;

        Ok(rule)
    }

    /// Running rules watching the given post; the comment-event caller fans
    /// out `process_comment` across these.
    pub async fn find_running_for_post(post_id: &str, pool: &PgPool) -> Result<Vec<Self>> {
        let rules = sqlx::query_as::<_, Self>(
            r#"
            SELECT *
            FROM automation_rules
            WHERE post_id = $1 AND status = 'running'
            ORDER BY created_at
            "#,
        )
        .bind(post_id)
        .fetch_all(pool)
        .await?;

        Ok(rules)
    }

    /// Increment the captured-leads counter after a successful enrollment.
    pub async fn increment_leads_captured(id: Uuid, pool: &PgPool) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE automation_rules
            SET leads_captured = leads_captured + 1,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// First configured keyword contained in the comment text,
    /// case-insensitively. Blank keywords never match.
    pub fn matched_keyword(&self, text: &str) -> Option<&str> {
        let text = text.to_lowercase();
        self.keywords
            .iter()
            .find(|k| !k.trim().is_empty() && text.contains(&k.to_lowercase()))
            .map(String::as_str)
    }
}
