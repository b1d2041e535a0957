//! HTTP clients for the services the importer reports to.
//!
//! Provides a minimal shared client with service-token auth, plus the upload
//! service and interactives API clients built on it. The capability traits in
//! [`traits`] are what the importer actually depends on.

pub mod error;
pub mod interactives;
pub mod traits;
pub mod upload;

pub use error::ClientError;
pub use interactives::InteractivesApiClient;
pub use traits::{CatalogApi, UploadBackend, UploadMetadata};
pub use upload::UploadServiceClient;

use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;

/// HTTP client shared by the service-specific clients.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    service_token: Option<String>,
    service: &'static str,
}

impl ApiClient {
    pub fn new(
        service: &'static str,
        base_url: &str,
        service_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_token: service_token.filter(|t| !t.is_empty()),
            service,
        })
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// `Authorization: Bearer {token}` when a service token is configured.
    fn apply_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.service_token {
            Some(token) => request.header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }

    /// Send the request and turn non-success statuses into `InvalidResponse`.
    async fn send(&self, uri: &str, request: RequestBuilder) -> Result<Response, ClientError> {
        let response = self.apply_auth(request).send().await.map_err(|e| {
            tracing::error!(error = %e, uri = %uri, service = self.service, "Failed to action API");
            ClientError::Http(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Client failed to read response body".to_string());
            return Err(ClientError::InvalidResponse {
                service: self.service,
                status: status.as_u16(),
                uri: uri.to_string(),
                body,
            });
        }

        Ok(response)
    }

    /// GET `{base_url}/health`.
    pub async fn health(&self) -> Result<(), ClientError> {
        let uri = self.build_url("/health");
        let request = self.client.get(&uri);
        self.send(&uri, request).await.map(drop)
    }
}
