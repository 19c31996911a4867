// Business domains
pub mod automation;
pub mod content;
pub mod webhooks;
