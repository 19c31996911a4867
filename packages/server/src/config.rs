use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub social_api_base: String,
    pub campaign_api_base: Option<String>,
    pub campaign_api_key: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .context("DATABASE_URL must be set")?,
            social_api_base: env::var("SOCIAL_API_BASE")
                .context("SOCIAL_API_BASE must be set")?,
            campaign_api_base: env::var("CAMPAIGN_API_BASE").ok(),
            campaign_api_key: env::var("CAMPAIGN_API_KEY").ok(),
        })
    }
}
