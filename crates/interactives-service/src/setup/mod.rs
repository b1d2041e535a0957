//! Application setup and initialization
//!
//! Builds every collaborator from configuration and starts the queue consumer.

pub mod routes;
pub mod server;

use crate::state::AppState;
use anyhow::{Context, Result};
use interactives_api_client::{CatalogApi, InteractivesApiClient, UploadBackend, UploadServiceClient};
use interactives_core::Config;
use interactives_importer::{InteractivesUploadedHandler, UploadService};
use interactives_infra::HealthRegistry;
use interactives_storage::{create_storage, ArchiveStore};
use interactives_worker::{
    ConsumerConfig, ImportMessageHandler, MessageSource, QueueConsumer, SqsMessageSource,
};
use std::sync::Arc;

const SERVICE_NAME: &str = "dp-interactives-importer";

pub struct App {
    pub router: axum::Router,
    pub consumer: QueueConsumer,
}

/// Initialize the entire application
pub async fn initialize_app(config: &Config) -> Result<App> {
    // Validate configuration first - fail fast on misconfiguration
    config.validate().context("Configuration validation failed")?;

    interactives_infra::init_telemetry(SERVICE_NAME, config.environment(), config.log_json())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        environment = %config.environment(),
        batch_size = config.batch_size(),
        consumer_workers = config.consumer_workers(),
        "Configuration loaded and validated successfully"
    );

    let storage = create_storage(config)
        .await
        .context("Failed to initialize archive storage")?;
    tracing::info!(backend = %storage.backend_type(), "Archive storage initialized");

    let token = Some(config.service_auth_token().to_string());
    let uploads: Arc<dyn UploadBackend> = Arc::new(
        UploadServiceClient::new(config.api_router_url(), token.clone(), config.http_timeout())
            .context("Failed to create upload service client")?,
    );
    let catalog: Arc<dyn CatalogApi> = Arc::new(
        InteractivesApiClient::new(config.api_router_url(), token, config.http_timeout())
            .context("Failed to create interactives API client")?,
    );

    let source: Arc<dyn MessageSource> = Arc::new(
        SqsMessageSource::from_env(config.aws_region(), config.s3_endpoint(), config.queue_url())
            .await,
    );

    let importer = InteractivesUploadedHandler::new(
        storage.clone(),
        UploadService::new(uploads.clone()),
        catalog.clone(),
        config.batch_size(),
    );

    let health = health_registry(config, storage, uploads, catalog, source.clone());

    let consumer = QueueConsumer::start(
        source,
        Arc::new(ImportMessageHandler::new(importer)),
        ConsumerConfig::from_config(config),
    );

    let state = Arc::new(AppState {
        config: config.clone(),
        health,
    });

    Ok(App {
        router: routes::setup_routes(state),
        consumer,
    })
}

fn health_registry(
    config: &Config,
    storage: Arc<dyn ArchiveStore>,
    uploads: Arc<dyn UploadBackend>,
    catalog: Arc<dyn CatalogApi>,
    source: Arc<dyn MessageSource>,
) -> HealthRegistry {
    let mut registry = HealthRegistry::new(config.healthcheck_timeout());

    registry.register("storage", move || {
        let storage = storage.clone();
        async move { storage.health_check().await }
    });
    registry.register("upload_service", move || {
        let uploads = uploads.clone();
        async move { uploads.health_check().await }
    });
    registry.register("interactives_api", move || {
        let catalog = catalog.clone();
        async move { catalog.health_check().await }
    });
    registry.register("queue", move || {
        let source = source.clone();
        async move { source.health_check().await }
    });

    registry
}
