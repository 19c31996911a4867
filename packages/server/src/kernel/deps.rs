//! Server dependencies for pipeline components (using traits for testability)
//!
//! This module provides the central dependency container used by the publish
//! scheduler, the automation engine, and the webhook dispatcher. All external
//! services use trait abstractions to enable testing.

use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::kernel::social_api::{
    CampaignApiClient, IntegrationPublisherResolver, SocialApiClient,
};
use crate::kernel::{BaseCampaignClient, BasePublisherResolver, BaseSocialClient};

/// Bound on every outbound HTTP call so a hung third party cannot stall a tick.
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Server dependencies accessible to pipeline components
#[derive(Clone)]
pub struct ServerDeps {
    pub db_pool: PgPool,
    /// Per-account publisher lookup (integration credentials live in the DB)
    pub publishers: Arc<dyn BasePublisherResolver>,
    /// Social-network actions (reactions, replies)
    pub social: Arc<dyn BaseSocialClient>,
    /// Outbound-campaign enrollment
    pub campaigns: Arc<dyn BaseCampaignClient>,
    /// Shared HTTP client for webhook delivery (bounded timeout)
    pub http: reqwest::Client,
}

impl ServerDeps {
    /// Create new ServerDeps with the given dependencies
    pub fn new(
        db_pool: PgPool,
        publishers: Arc<dyn BasePublisherResolver>,
        social: Arc<dyn BaseSocialClient>,
        campaigns: Arc<dyn BaseCampaignClient>,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            db_pool,
            publishers,
            social,
            campaigns,
            http,
        }
    }

    /// Wire up production dependencies from configuration.
    pub fn production(db_pool: PgPool, config: &Config) -> Self {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        let publishers = Arc::new(IntegrationPublisherResolver::new(
            db_pool.clone(),
            config.social_api_base.clone(),
            http.clone(),
        ));
        let social = Arc::new(SocialApiClient::new(
            config.social_api_base.clone(),
            http.clone(),
        ));
        let campaigns = Arc::new(CampaignApiClient::new(
            config.campaign_api_base.clone(),
            config.campaign_api_key.clone(),
            http.clone(),
        ));

        Self {
            db_pool,
            publishers,
            social,
            campaigns,
            http,
        }
    }
}
