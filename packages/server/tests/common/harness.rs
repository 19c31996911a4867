//! Test harness with testcontainers for integration testing.
//!
//! Uses a shared Postgres container across all tests for dramatically
//! improved performance. Each test gets its own database inside the
//! container: the scheduler tick scans whole tables, so parallel tests
//! must not share one.

use anyhow::{Context, Result};
use sqlx::PgPool;
use std::sync::Arc;
use test_context::AsyncTestContext;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use uuid::Uuid;

use pipeline_core::kernel::{
    BaseCampaignClient, BasePublisherResolver, BaseSocialClient, ServerDeps,
};

/// Shared test infrastructure that persists across all tests.
struct SharedTestInfra {
    /// Connection URL without a database name.
    base_url: String,
    // Keep the container alive for the entire test run
    _postgres: ContainerAsync<Postgres>,
}

/// Global shared infrastructure - initialized once, reused by all tests.
static SHARED_INFRA: OnceCell<SharedTestInfra> = OnceCell::const_new();

impl SharedTestInfra {
    /// Initialize shared infrastructure (container + admin connection).
    async fn init() -> Result<Self> {
        // Initialize tracing subscriber to respect RUST_LOG environment variable.
        // Run tests with: RUST_LOG=debug cargo test -- --nocapture
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let postgres = Postgres::default()
            .with_tag("16")
            .with_cmd(["-c", "max_connections=200"])
            .start()
            .await
            .context("Failed to start Postgres container")?;

        let pg_host = postgres.get_host().await?;
        let pg_port = postgres.get_host_port_ipv4(5432).await?;
        let base_url = format!("postgresql://postgres:postgres@{}:{}", pg_host, pg_port);

        // Readiness check only. Each `#[tokio::test]` runs on its own
        // runtime, and a pool's connections are bound to the runtime they
        // were created on, so no pool may be retained here.
        let admin_pool = PgPool::connect(&format!("{}/postgres", base_url))
            .await
            .context("Failed to connect to Postgres")?;
        admin_pool.close().await;

        Ok(Self {
            base_url,
            _postgres: postgres,
        })
    }

    async fn get() -> &'static Self {
        SHARED_INFRA
            .get_or_init(|| async {
                Self::init()
                    .await
                    .expect("Failed to initialize shared test infrastructure")
            })
            .await
    }
}

/// Test harness that manages test infrastructure.
///
/// Each test gets a freshly migrated database of its own, reusing the
/// shared container.
pub struct TestHarness {
    /// Database pool - use this for test fixtures.
    pub db_pool: PgPool,
}

impl AsyncTestContext for TestHarness {
    async fn setup() -> Self {
        Self::new().await.expect("Failed to create test harness")
    }

    async fn teardown(self) {
        // Databases are cheap and die with the container
    }
}

impl TestHarness {
    /// Creates a new test harness with an isolated database.
    pub async fn new() -> Result<Self> {
        let infra = SharedTestInfra::get().await;

        // Connect on this test's runtime: connections from another test's
        // (possibly already dropped) runtime would hang on first use.
        let admin_pool = PgPool::connect(&format!("{}/postgres", infra.base_url))
            .await
            .context("Failed to connect to Postgres")?;

        let db_name = format!("test_{}", Uuid::new_v4().simple());
        sqlx::query(&format!(r#"CREATE DATABASE "{}""#, db_name))
            .execute(&admin_pool)
            .await
            .context("Failed to create test database")?;
        admin_pool.close().await;

        let db_pool = PgPool::connect(&format!("{}/{}", infra.base_url, db_name))
            .await
            .context("Failed to connect to test database")?;

        sqlx::migrate!("./migrations")
            .run(&db_pool)
            .await
            .context("Failed to run migrations")?;

        Ok(Self { db_pool })
    }

    /// Build ServerDeps around this harness's pool with the given mocks.
    pub fn deps_with(
        &self,
        publishers: Arc<dyn BasePublisherResolver>,
        social: Arc<dyn BaseSocialClient>,
        campaigns: Arc<dyn BaseCampaignClient>,
    ) -> ServerDeps {
        ServerDeps::new(self.db_pool.clone(), publishers, social, campaigns)
    }
}
