//! Kernel module - server infrastructure and dependencies.

pub mod deps;
pub mod scheduled_tasks;
pub mod social_api;
pub mod test_dependencies;
pub mod traits;

pub use deps::ServerDeps;
pub use traits::{
    BaseCampaignClient, BasePublisher, BasePublisherResolver, BaseSocialClient, EnrollOutcome,
    LeadInput, PublishReceipt,
};
