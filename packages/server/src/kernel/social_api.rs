//! HTTP clients for the social-network and outbound-campaign APIs.
//!
//! Production implementations of the `Base*` traits in `kernel::traits`.
//! Publishing is a per-account capability: `IntegrationPublisherResolver`
//! looks up the owner's stored integration credentials and returns a typed
//! publisher, or `None` when the account has no integration configured.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use super::traits::{
    BaseCampaignClient, BasePublisher, BasePublisherResolver, BaseSocialClient, EnrollOutcome,
    LeadInput, PublishReceipt,
};

// =============================================================================
// Stored integration credentials
// =============================================================================

/// One account's social-network integration (credential row).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SocialIntegration {
    pub id: Uuid,
    pub account_id: Uuid,
    pub provider: String,
    pub access_token: String,
    /// Social account id used for posting, liking, and replying.
    pub posting_account: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SocialIntegration {
    /// Find the active integration for an account, if any.
    pub async fn find_active(account_id: Uuid, pool: &PgPool) -> Result<Option<Self>> {
        let integration = sqlx::query_as::<_, Self>(
            r#"
            SELECT id, account_id, provider, access_token, posting_account,
                   active, created_at, updated_at
            FROM social_integrations
            WHERE account_id = $1 AND active = true
            ORDER BY created_at
            LIMIT 1
            "#,
        )
        .bind(account_id)
        .fetch_optional(pool)
        .await?;

        Ok(integration)
    }
}

// =============================================================================
// Publisher resolution
// =============================================================================

/// Resolves a publisher per account from stored integration credentials.
pub struct IntegrationPublisherResolver {
    pool: PgPool,
    api_base: String,
    http: reqwest::Client,
}

impl IntegrationPublisherResolver {
    pub fn new(pool: PgPool, api_base: String, http: reqwest::Client) -> Self {
        Self {
            pool,
            api_base,
            http,
        }
    }
}

#[async_trait]
impl BasePublisherResolver for IntegrationPublisherResolver {
    async fn resolve(&self, account_id: Uuid) -> Result<Option<Arc<dyn BasePublisher>>> {
        let Some(integration) = SocialIntegration::find_active(account_id, &self.pool).await?
        else {
            return Ok(None);
        };

        Ok(Some(Arc::new(AccountPublisher {
            api_base: self.api_base.clone(),
            http: self.http.clone(),
            integration,
        })))
    }
}

/// Publisher bound to one account's integration credentials.
struct AccountPublisher {
    api_base: String,
    http: reqwest::Client,
    integration: SocialIntegration,
}

#[derive(Deserialize)]
struct CreatePostResponse {
    id: Option<String>,
}

#[async_trait]
impl BasePublisher for AccountPublisher {
    async fn publish(&self, content: &str) -> Result<PublishReceipt> {
        let url = format!(
            "{}/v1/accounts/{}/posts",
            self.api_base, self.integration.posting_account
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.integration.access_token)
            .json(&serde_json::json!({ "content": content }))
            .send()
            .await
            .context("publish request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("publish rejected ({}): {}", status, body));
        }

        let created: CreatePostResponse = response
            .json()
            .await
            .context("invalid publish response body")?;

        Ok(PublishReceipt {
            post_id: created.id,
            provider: self.integration.provider.clone(),
        })
    }
}

// =============================================================================
// Social actions
// =============================================================================

/// Reaction/reply client against the social-network API.
pub struct SocialApiClient {
    api_base: String,
    http: reqwest::Client,
}

impl SocialApiClient {
    pub fn new(api_base: String, http: reqwest::Client) -> Self {
        Self { api_base, http }
    }

    async fn post_action(&self, url: &str, body: serde_json::Value) -> Result<()> {
        let response = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .context("social API request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("social API rejected ({}): {}", status, body));
        }

        Ok(())
    }
}

#[async_trait]
impl BaseSocialClient for SocialApiClient {
    async fn add_reaction(&self, post_id: &str, account_id: &str, reaction: &str) -> Result<()> {
        let url = format!("{}/v1/posts/{}/reactions", self.api_base, post_id);
        self.post_action(
            &url,
            serde_json::json!({ "account_id": account_id, "type": reaction }),
        )
        .await
    }

    async fn add_comment(&self, post_id: &str, account_id: &str, text: &str) -> Result<()> {
        let url = format!("{}/v1/posts/{}/comments", self.api_base, post_id);
        self.post_action(
            &url,
            serde_json::json!({ "account_id": account_id, "text": text }),
        )
        .await
    }
}

// =============================================================================
// Outbound campaigns
// =============================================================================

/// Campaign enrollment client. Construction never fails; calls return an
/// error when the campaign API is not configured for this deployment.
pub struct CampaignApiClient {
    api_base: Option<String>,
    api_key: Option<String>,
    http: reqwest::Client,
}

impl CampaignApiClient {
    pub fn new(api_base: Option<String>, api_key: Option<String>, http: reqwest::Client) -> Self {
        Self {
            api_base,
            api_key,
            http,
        }
    }
}

#[async_trait]
impl BaseCampaignClient for CampaignApiClient {
    async fn enroll_leads(&self, campaign_id: &str, leads: &[LeadInput]) -> Result<EnrollOutcome> {
        let (api_base, api_key) = match (&self.api_base, &self.api_key) {
            (Some(base), Some(key)) => (base, key),
            _ => return Err(anyhow!("outbound campaign API not configured")),
        };

        let url = format!("{}/v1/campaigns/{}/leads", api_base, campaign_id);
        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&serde_json::json!({ "leads": leads }))
            .send()
            .await
            .context("campaign API request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("campaign API rejected ({}): {}", status, body));
        }

        let outcome: EnrollOutcome = response
            .json()
            .await
            .context("invalid campaign API response body")?;

        Ok(outcome)
    }
}
