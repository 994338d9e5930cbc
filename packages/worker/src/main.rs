// Main entry point for the pipeline worker

use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use worker_core::clients::{
    ChromiumBrowserProvider, GooglePlacesClient, HttpHtmlFetcher, PagespeedClient,
    S3ScreenshotStore,
};
use worker_core::kernel::jobs::{
    payloads, JobEvents, JobRegistry, JobRunner, JobRunnerConfig, PostgresJobQueue,
};
use worker_core::kernel::jobs::payloads::{
    AuditWebsiteJob, GridSearchJob, ProcessRawDataJob, SeedCampaignJob,
};
use worker_core::processors;
use worker_core::storage::PostgresStore;
use worker_core::{Config, WorkerDeps};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,worker_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    tracing::info!("Starting Mainstreet pipeline worker");

    let config = Config::from_env().context("Failed to load configuration")?;

    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    let events = JobEvents::default();
    let queue = Arc::new(PostgresJobQueue::new(pool.clone(), events));

    let deps = Arc::new(WorkerDeps {
        store: Arc::new(PostgresStore::new(pool)),
        places: Arc::new(GooglePlacesClient::new(
            config.places_base_url.clone(),
            config.places_api_key.clone(),
        )),
        browser: Arc::new(ChromiumBrowserProvider),
        screenshots: Arc::new(
            S3ScreenshotStore::from_env(config.screenshot_bucket.clone()).await,
        ),
        audit_tool: Arc::new(PagespeedClient::new(
            config.audit_tool_base_url.clone(),
            config.audit_tool_api_key.clone(),
        )),
        fetcher: Arc::new(HttpHtmlFetcher::new()),
        queue: queue.clone(),
    });

    let mut registry = JobRegistry::new();
    registry.register::<SeedCampaignJob, _, _>(payloads::SEED_CAMPAIGN, |job, deps| async move {
        processors::campaign::run(job, &deps).await?;
        Ok(())
    });
    registry.register::<GridSearchJob, _, _>(payloads::GRID_SEARCH, |job, deps| async move {
        processors::grid_search::run(job, &deps).await?;
        Ok(())
    });
    registry.register::<ProcessRawDataJob, _, _>(
        payloads::PROCESS_RAW_DATA,
        |job, deps| async move {
            processors::data_processing::run(job, &deps).await?;
            Ok(())
        },
    );
    registry.register::<AuditWebsiteJob, _, _>(payloads::AUDIT_WEBSITE, |job, deps| async move {
        processors::website_audit::run(job, &deps).await?;
        Ok(())
    });

    let runner_config = JobRunnerConfig {
        batch_size: config.worker_batch_size,
        poll_interval: std::time::Duration::from_secs(config.poll_interval_secs),
        ..Default::default()
    };

    tracing::info!(
        batch_size = runner_config.batch_size,
        "Worker ready, entering poll loop"
    );

    JobRunner::with_config(queue, Arc::new(registry), deps, runner_config)
        .run_until_shutdown()
        .await
}
