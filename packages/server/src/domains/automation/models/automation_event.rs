//! Automation event log - append-only audit trail of engine activity.
//!
//! Rows are never updated or deleted. One processed comment produces one to
//! five events: detection, keyword match, then one per attempted action.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "automation_event_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AutomationEventType {
    CommentDetected,
    KeywordMatched,
    LikeSent,
    LikeFailed,
    LeadEnrolled,
    LeadFailed,
    ReplySent,
    ReplyFailed,
}

#[derive(FromRow, Debug, Clone, Serialize, Deserialize)]
pub struct AutomationEvent {
    pub id: i64,
    pub automation_id: Uuid,
    pub event_type: AutomationEventType,
    pub commenter_id: Option<String>,
    pub commenter_name: Option<String>,
    pub action_details: Option<String>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AutomationEvent {
    /// Append one event to the log.
    pub async fn log(
        automation_id: Uuid,
        event_type: AutomationEventType,
        commenter_id: Option<&str>,
        commenter_name: Option<&str>,
        action_details: Option<&str>,
        error: Option<&str>,
        pool: &PgPool,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO automation_events (
                automation_id, event_type, commenter_id, commenter_name,
                action_details, error
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(automation_id)
        .bind(event_type)
        .bind(commenter_id)
        .bind(commenter_name)
        .bind(action_details)
        .bind(error)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// All events for an automation, oldest first.
    pub async fn find_for_automation(automation_id: Uuid, pool: &PgPool) -> Result<Vec<Self>> {
        let events = sqlx::query_as::<_, Self>(
            r#"
            SELECT *
            FROM automation_events
            WHERE automation_id = $1
            ORDER BY id
            "#,
        )
        .bind(automation_id)
        .fetch_all(pool)
        .await?;

        Ok(events)
    }
}
