//! In-memory upload service and catalog API.

use async_trait::async_trait;
use bytes::Bytes;
use interactives_api_client::{CatalogApi, ClientError, UploadBackend, UploadMetadata};
use interactives_core::constants::DUPLICATE_FILE_MARKER;
use interactives_core::StatusUpdate;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// One recorded upload attempt.
#[derive(Debug, Clone)]
pub struct UploadCall {
    pub content: Bytes,
    pub metadata: UploadMetadata,
}

#[derive(Debug, Clone)]
enum UploadBehaviour {
    Accept,
    DuplicateFirst(u32),
    AlwaysDuplicate,
    AlwaysFail(String),
}

fn invalid_response(status: u16, body: String) -> ClientError {
    ClientError::InvalidResponse {
        service: "upload-service",
        status,
        uri: "mock://upload-new".to_string(),
        body,
    }
}

/// Upload backend that records every call and rejects paths it already holds.
#[derive(Clone)]
pub struct MockUploadBackend {
    calls: Arc<Mutex<Vec<UploadCall>>>,
    stored: Arc<Mutex<HashSet<String>>>,
    behaviour: Arc<Mutex<UploadBehaviour>>,
}

impl Default for MockUploadBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockUploadBackend {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            stored: Arc::new(Mutex::new(HashSet::new())),
            behaviour: Arc::new(Mutex::new(UploadBehaviour::Accept)),
        }
    }

    /// Report the first `count` uploads as duplicates.
    pub fn with_duplicates_before_success(self, count: u32) -> Self {
        *self.behaviour.lock().unwrap() = UploadBehaviour::DuplicateFirst(count);
        self
    }

    pub fn always_duplicate(self) -> Self {
        *self.behaviour.lock().unwrap() = UploadBehaviour::AlwaysDuplicate;
        self
    }

    pub fn always_fail(self, message: &str) -> Self {
        *self.behaviour.lock().unwrap() = UploadBehaviour::AlwaysFail(message.to_string());
        self
    }

    pub fn calls(&self) -> Vec<UploadCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Destinations accepted so far.
    pub fn stored(&self) -> HashSet<String> {
        self.stored.lock().unwrap().clone()
    }
}

#[async_trait]
impl UploadBackend for MockUploadBackend {
    async fn upload(&self, content: Bytes, metadata: &UploadMetadata) -> Result<(), ClientError> {
        self.calls.lock().unwrap().push(UploadCall {
            content,
            metadata: metadata.clone(),
        });

        let destination = metadata.destination();
        let duplicate = invalid_response(
            400,
            format!("{} {}", destination, DUPLICATE_FILE_MARKER),
        );

        {
            let mut behaviour = self.behaviour.lock().unwrap();
            match &mut *behaviour {
                UploadBehaviour::Accept => {}
                UploadBehaviour::DuplicateFirst(0) => {}
                UploadBehaviour::DuplicateFirst(remaining) => {
                    *remaining -= 1;
                    return Err(duplicate);
                }
                UploadBehaviour::AlwaysDuplicate => return Err(duplicate),
                UploadBehaviour::AlwaysFail(message) => {
                    return Err(invalid_response(500, message.clone()))
                }
            }
        }

        if !self.stored.lock().unwrap().insert(destination) {
            return Err(duplicate);
        }
        Ok(())
    }

    async fn health_check(&self) -> Result<(), ClientError> {
        Ok(())
    }
}

/// Catalog API that records status updates.
#[derive(Clone, Default)]
pub struct MockCatalogApi {
    updates: Arc<Mutex<Vec<(String, StatusUpdate)>>>,
    attempts: Arc<Mutex<usize>>,
    fail: bool,
}

impl MockCatalogApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every update.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Successfully delivered updates as `(import_id, update)`.
    pub fn updates(&self) -> Vec<(String, StatusUpdate)> {
        self.updates.lock().unwrap().clone()
    }

    /// Every call, whether or not it succeeded.
    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }
}

#[async_trait]
impl CatalogApi for MockCatalogApi {
    async fn update_import_status(
        &self,
        import_id: &str,
        update: &StatusUpdate,
    ) -> Result<(), ClientError> {
        *self.attempts.lock().unwrap() += 1;
        if self.fail {
            return Err(ClientError::InvalidResponse {
                service: "interactives-api",
                status: 503,
                uri: format!("mock://v1/interactives/{}", import_id),
                body: "unavailable".to_string(),
            });
        }
        self.updates
            .lock()
            .unwrap()
            .push((import_id.to_string(), update.clone()));
        Ok(())
    }

    async fn health_check(&self) -> Result<(), ClientError> {
        Ok(())
    }
}
