// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Business logic (like "publish due items") lives in domain functions that
// use these traits.
//
// Naming convention: Base* for trait names (e.g., BasePublisher)

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

// =============================================================================
// Publisher (per-account publish capability)
// =============================================================================

/// Result of a successful external publish call.
#[derive(Debug, Clone)]
pub struct PublishReceipt {
    /// Post identifier assigned by the external network, if any.
    pub post_id: Option<String>,
    /// Which backend actually published the content (e.g., "linkedin").
    pub provider: String,
}

/// A resolved publish capability for one account.
#[async_trait]
pub trait BasePublisher: Send + Sync {
    /// Publish resolved content to the external network.
    async fn publish(&self, content: &str) -> Result<PublishReceipt>;
}

/// Per-account publisher lookup.
///
/// Returns `None` when the account has no publishing integration configured;
/// that is a valid state (the scheduler publishes locally), not an error.
#[async_trait]
pub trait BasePublisherResolver: Send + Sync {
    async fn resolve(&self, account_id: Uuid) -> Result<Option<Arc<dyn BasePublisher>>>;
}

// =============================================================================
// Social actions (likes / replies on external posts)
// =============================================================================

#[async_trait]
pub trait BaseSocialClient: Send + Sync {
    /// React to a post (e.g., "like") as the given posting account.
    async fn add_reaction(&self, post_id: &str, account_id: &str, reaction: &str) -> Result<()>;

    /// Comment on a post as the given posting account.
    async fn add_comment(&self, post_id: &str, account_id: &str, text: &str) -> Result<()>;
}

// =============================================================================
// Outbound campaign enrollment
// =============================================================================

/// A lead to enroll in an outbound campaign.
#[derive(Debug, Clone, serde::Serialize)]
pub struct LeadInput {
    pub profile_url: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub custom_variables: serde_json::Value,
}

/// Outcome reported by the campaign API.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct EnrollOutcome {
    pub success: bool,
    pub error: Option<String>,
}

#[async_trait]
pub trait BaseCampaignClient: Send + Sync {
    async fn enroll_leads(&self, campaign_id: &str, leads: &[LeadInput]) -> Result<EnrollOutcome>;
}
