// TestDependencies - mock implementations for testing
//
// Provides mock collaborators that can be injected into ServerDeps for tests.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use super::traits::{
    BaseCampaignClient, BasePublisher, BasePublisherResolver, BaseSocialClient, EnrollOutcome,
    LeadInput, PublishReceipt,
};

// =============================================================================
// Mock Publisher
// =============================================================================

/// Arguments captured from an enroll call
#[derive(Debug, Clone)]
pub struct EnrollCallArgs {
    pub campaign_id: String,
    pub leads: Vec<LeadInput>,
}

/// Arguments captured from a reaction call
#[derive(Debug, Clone)]
pub struct ReactionCallArgs {
    pub post_id: String,
    pub account_id: String,
    pub reaction: String,
}

/// Arguments captured from a comment call
#[derive(Debug, Clone)]
pub struct CommentCallArgs {
    pub post_id: String,
    pub account_id: String,
    pub text: String,
}

pub struct MockPublisher {
    responses: Arc<Mutex<Vec<Result<PublishReceipt, String>>>>,
    publish_calls: Arc<Mutex<Vec<String>>>,
}

impl MockPublisher {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            publish_calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue a successful publish response with the given external post id
    pub fn with_post_id(self, post_id: &str) -> Self {
        self.responses.lock().unwrap().push(Ok(PublishReceipt {
            post_id: Some(post_id.to_string()),
            provider: "mock".to_string(),
        }));
        self
    }

    /// Queue a publish failure
    pub fn with_error(self, error: &str) -> Self {
        self.responses.lock().unwrap().push(Err(error.to_string()));
        self
    }

    /// Get all content strings that were published
    pub fn publish_calls(&self) -> Vec<String> {
        self.publish_calls.lock().unwrap().clone()
    }

    /// Number of publish attempts made against this publisher
    pub fn call_count(&self) -> usize {
        self.publish_calls.lock().unwrap().len()
    }
}

impl Default for MockPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BasePublisher for MockPublisher {
    async fn publish(&self, content: &str) -> Result<PublishReceipt> {
        // Record the call
        self.publish_calls.lock().unwrap().push(content.to_string());

        let mut responses = self.responses.lock().unwrap();
        if !responses.is_empty() {
            responses.remove(0).map_err(|e| anyhow!(e))
        } else {
            Ok(PublishReceipt {
                post_id: Some(format!("mock-post-{}", Uuid::new_v4())),
                provider: "mock".to_string(),
            })
        }
    }
}

// =============================================================================
// Static Publisher Resolver
// =============================================================================

/// Resolver backed by an in-memory map; accounts without an entry resolve
/// to no publisher (local publish).
pub struct StaticPublisherResolver {
    publishers: Mutex<HashMap<Uuid, Arc<dyn BasePublisher>>>,
}

impl StaticPublisherResolver {
    pub fn new() -> Self {
        Self {
            publishers: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_publisher(self, account_id: Uuid, publisher: Arc<dyn BasePublisher>) -> Self {
        self.publishers.lock().unwrap().insert(account_id, publisher);
        self
    }
}

impl Default for StaticPublisherResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BasePublisherResolver for StaticPublisherResolver {
    async fn resolve(&self, account_id: Uuid) -> Result<Option<Arc<dyn BasePublisher>>> {
        Ok(self.publishers.lock().unwrap().get(&account_id).cloned())
    }
}

// =============================================================================
// Mock Social Client
// =============================================================================

pub struct MockSocialClient {
    reaction_calls: Arc<Mutex<Vec<ReactionCallArgs>>>,
    comment_calls: Arc<Mutex<Vec<CommentCallArgs>>>,
    reaction_error: Arc<Mutex<Option<String>>>,
    comment_error: Arc<Mutex<Option<String>>>,
}

impl MockSocialClient {
    pub fn new() -> Self {
        Self {
            reaction_calls: Arc::new(Mutex::new(Vec::new())),
            comment_calls: Arc::new(Mutex::new(Vec::new())),
            reaction_error: Arc::new(Mutex::new(None)),
            comment_error: Arc::new(Mutex::new(None)),
        }
    }

    /// Make all reaction calls fail with the given error
    pub fn with_reaction_error(self, error: &str) -> Self {
        *self.reaction_error.lock().unwrap() = Some(error.to_string());
        self
    }

    /// Make all comment calls fail with the given error
    pub fn with_comment_error(self, error: &str) -> Self {
        *self.comment_error.lock().unwrap() = Some(error.to_string());
        self
    }

    pub fn reaction_calls(&self) -> Vec<ReactionCallArgs> {
        self.reaction_calls.lock().unwrap().clone()
    }

    pub fn comment_calls(&self) -> Vec<CommentCallArgs> {
        self.comment_calls.lock().unwrap().clone()
    }

    /// Total external calls made through this client
    pub fn call_count(&self) -> usize {
        self.reaction_calls.lock().unwrap().len() + self.comment_calls.lock().unwrap().len()
    }
}

impl Default for MockSocialClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseSocialClient for MockSocialClient {
    async fn add_reaction(&self, post_id: &str, account_id: &str, reaction: &str) -> Result<()> {
        self.reaction_calls.lock().unwrap().push(ReactionCallArgs {
            post_id: post_id.to_string(),
            account_id: account_id.to_string(),
            reaction: reaction.to_string(),
        });

        match self.reaction_error.lock().unwrap().as_ref() {
            Some(error) => Err(anyhow!(error.clone())),
            None => Ok(()),
        }
    }

    async fn add_comment(&self, post_id: &str, account_id: &str, text: &str) -> Result<()> {
        self.comment_calls.lock().unwrap().push(CommentCallArgs {
            post_id: post_id.to_string(),
            account_id: account_id.to_string(),
            text: text.to_string(),
        });

        match self.comment_error.lock().unwrap().as_ref() {
            Some(error) => Err(anyhow!(error.clone())),
            None => Ok(()),
        }
    }
}

// =============================================================================
// Mock Campaign Client
// =============================================================================

pub struct MockCampaignClient {
    outcomes: Arc<Mutex<Vec<Result<EnrollOutcome, String>>>>,
    enroll_calls: Arc<Mutex<Vec<EnrollCallArgs>>>,
}

impl MockCampaignClient {
    pub fn new() -> Self {
        Self {
            outcomes: Arc::new(Mutex::new(Vec::new())),
            enroll_calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue an unsuccessful enrollment outcome reported by the API
    pub fn with_rejection(self, error: &str) -> Self {
        self.outcomes.lock().unwrap().push(Ok(EnrollOutcome {
            success: false,
            error: Some(error.to_string()),
        }));
        self
    }

    /// Queue a transport-level enrollment failure
    pub fn with_error(self, error: &str) -> Self {
        self.outcomes.lock().unwrap().push(Err(error.to_string()));
        self
    }

    pub fn enroll_calls(&self) -> Vec<EnrollCallArgs> {
        self.enroll_calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.enroll_calls.lock().unwrap().len()
    }
}

impl Default for MockCampaignClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseCampaignClient for MockCampaignClient {
    async fn enroll_leads(&self, campaign_id: &str, leads: &[LeadInput]) -> Result<EnrollOutcome> {
        self.enroll_calls.lock().unwrap().push(EnrollCallArgs {
            campaign_id: campaign_id.to_string(),
            leads: leads.to_vec(),
        });

        let mut outcomes = self.outcomes.lock().unwrap();
        if !outcomes.is_empty() {
            outcomes.remove(0).map_err(|e| anyhow!(e))
        } else {
            Ok(EnrollOutcome {
                success: true,
                error: None,
            })
        }
    }
}
