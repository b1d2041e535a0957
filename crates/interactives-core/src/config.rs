//! Configuration module
//!
//! This module reads the importer configuration from the process environment,
//! covering the queue, storage, downstream APIs and batch concurrency.

use std::env;
use std::time::Duration;

use crate::storage_types::StorageBackend;

// Common constants
const BIND_ADDR: &str = "0.0.0.0:27400";
const API_ROUTER_URL: &str = "http://localhost:25100";
const AWS_REGION: &str = "eu-west-1";
const DOWNLOAD_BUCKET_NAME: &str = "dp-interactives-file-uploads";
const CONSUMER_WORKERS: usize = 1;
const BATCH_SIZE: usize = 10;
const GRACEFUL_SHUTDOWN_TIMEOUT_SECS: u64 = 5;
const HEALTHCHECK_TIMEOUT_SECS: u64 = 5;
const HTTP_TIMEOUT_SECS: u64 = 60;

/// Importer configuration
#[derive(Clone, Debug)]
pub struct ImporterConfig {
    pub bind_addr: String,
    pub environment: String,
    pub log_format: String,
    // Downstream services (upload service and interactives API sit behind the router)
    pub api_router_url: String,
    pub service_auth_token: String,
    pub http_timeout_secs: u64,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub aws_region: String,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (localstack, MinIO)
    pub download_bucket_name: String,
    pub local_storage_path: Option<String>,
    // Queue configuration
    pub queue_url: String,
    pub consumer_workers: usize,
    // Archive processing
    pub batch_size: usize,
    // Lifecycle
    pub graceful_shutdown_timeout_secs: u64,
    pub healthcheck_timeout_secs: u64,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<ImporterConfig>);

impl Config {
    fn as_importer(&self) -> &ImporterConfig {
        &self.0
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = ImporterConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_importer().validate()
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let environment = self.as_importer().environment.to_lowercase();
        environment == "production" || environment == "prod"
    }

    pub fn bind_addr(&self) -> &str {
        &self.as_importer().bind_addr
    }

    pub fn environment(&self) -> &str {
        &self.as_importer().environment
    }

    /// Whether logs should be emitted as JSON (`LOG_FORMAT=json`).
    pub fn log_json(&self) -> bool {
        self.as_importer().log_format.eq_ignore_ascii_case("json")
    }

    pub fn api_router_url(&self) -> &str {
        &self.as_importer().api_router_url
    }

    pub fn service_auth_token(&self) -> &str {
        &self.as_importer().service_auth_token
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.as_importer().http_timeout_secs)
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.as_importer().storage_backend
    }

    pub fn aws_region(&self) -> &str {
        &self.as_importer().aws_region
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.as_importer().s3_endpoint.as_deref()
    }

    pub fn download_bucket_name(&self) -> &str {
        &self.as_importer().download_bucket_name
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.as_importer().local_storage_path.as_deref()
    }

    pub fn queue_url(&self) -> &str {
        &self.as_importer().queue_url
    }

    pub fn consumer_workers(&self) -> usize {
        self.as_importer().consumer_workers
    }

    pub fn batch_size(&self) -> usize {
        self.as_importer().batch_size
    }

    pub fn graceful_shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.as_importer().graceful_shutdown_timeout_secs)
    }

    pub fn healthcheck_timeout(&self) -> Duration {
        Duration::from_secs(self.as_importer().healthcheck_timeout_secs)
    }
}

impl ImporterConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(value) => value.parse()?,
            Err(_) => StorageBackend::S3,
        };

        let batch_size = env::var("BATCH_SIZE")
            .unwrap_or_else(|_| BATCH_SIZE.to_string())
            .parse::<usize>()
            .map_err(|_| anyhow::anyhow!("BATCH_SIZE must be a valid number"))?;

        let consumer_workers = env::var("CONSUMER_WORKERS")
            .or_else(|_| env::var("KAFKA_CONSUMER_WORKERS"))
            .unwrap_or_else(|_| CONSUMER_WORKERS.to_string())
            .parse::<usize>()
            .map_err(|_| anyhow::anyhow!("CONSUMER_WORKERS must be a valid number"))?;

        Ok(ImporterConfig {
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| BIND_ADDR.to_string()),
            environment,
            log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string()),
            api_router_url: env::var("API_ROUTER_URL")
                .unwrap_or_else(|_| API_ROUTER_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            service_auth_token: env::var("SERVICE_AUTH_TOKEN").unwrap_or_default(),
            http_timeout_secs: env::var("HTTP_TIMEOUT_SECS")
                .unwrap_or_else(|_| HTTP_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(HTTP_TIMEOUT_SECS),
            storage_backend,
            aws_region: env::var("AWS_REGION").unwrap_or_else(|_| AWS_REGION.to_string()),
            s3_endpoint: env::var("S3_ENDPOINT").ok().filter(|s| !s.trim().is_empty()),
            download_bucket_name: env::var("DOWNLOAD_BUCKET_NAME")
                .unwrap_or_else(|_| DOWNLOAD_BUCKET_NAME.to_string()),
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            queue_url: env::var("INTERACTIVES_QUEUE_URL").unwrap_or_default(),
            consumer_workers,
            batch_size,
            graceful_shutdown_timeout_secs: env::var("GRACEFUL_SHUTDOWN_TIMEOUT_SECS")
                .unwrap_or_else(|_| GRACEFUL_SHUTDOWN_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(GRACEFUL_SHUTDOWN_TIMEOUT_SECS),
            healthcheck_timeout_secs: env::var("HEALTHCHECK_TIMEOUT_SECS")
                .unwrap_or_else(|_| HEALTHCHECK_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(HEALTHCHECK_TIMEOUT_SECS),
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.batch_size == 0 {
            return Err(anyhow::anyhow!("BATCH_SIZE must be greater than zero"));
        }

        if self.consumer_workers == 0 {
            return Err(anyhow::anyhow!("CONSUMER_WORKERS must be greater than zero"));
        }

        if self.queue_url.trim().is_empty() {
            return Err(anyhow::anyhow!("INTERACTIVES_QUEUE_URL must be set"));
        }

        match self.storage_backend {
            StorageBackend::S3 => {
                if self.download_bucket_name.trim().is_empty() {
                    return Err(anyhow::anyhow!(
                        "DOWNLOAD_BUCKET_NAME must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> ImporterConfig {
        ImporterConfig {
            bind_addr: BIND_ADDR.to_string(),
            environment: "test".to_string(),
            log_format: "json".to_string(),
            api_router_url: API_ROUTER_URL.to_string(),
            service_auth_token: "token".to_string(),
            http_timeout_secs: HTTP_TIMEOUT_SECS,
            storage_backend: StorageBackend::S3,
            aws_region: AWS_REGION.to_string(),
            s3_endpoint: None,
            download_bucket_name: DOWNLOAD_BUCKET_NAME.to_string(),
            local_storage_path: None,
            queue_url: "http://localhost:4566/000000000000/interactives-import".to_string(),
            consumer_workers: CONSUMER_WORKERS,
            batch_size: BATCH_SIZE,
            graceful_shutdown_timeout_secs: GRACEFUL_SHUTDOWN_TIMEOUT_SECS,
            healthcheck_timeout_secs: HEALTHCHECK_TIMEOUT_SECS,
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let mut config = valid_config();
        config.batch_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let mut config = valid_config();
        config.consumer_workers = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_queue_url_rejected() {
        let mut config = valid_config();
        config.queue_url = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_local_backend_requires_path() {
        let mut config = valid_config();
        config.storage_backend = StorageBackend::Local;
        assert!(config.validate().is_err());

        config.local_storage_path = Some("/tmp/interactives".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_getters_and_production_flag() {
        let mut inner = valid_config();
        inner.environment = "Production".to_string();
        let config = Config(Box::new(inner));

        assert!(config.is_production());
        assert!(config.log_json());
        assert_eq!(config.batch_size(), BATCH_SIZE);
        assert_eq!(config.graceful_shutdown_timeout(), Duration::from_secs(5));
        assert_eq!(config.s3_endpoint(), None);
    }
}
