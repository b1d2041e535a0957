//! Capability traits for the downstream services.
//!
//! The importer depends on these traits only; the HTTP clients in this crate
//! implement them and tests substitute in-memory fakes.

use crate::ClientError;
use async_trait::async_trait;
use bytes::Bytes;
use interactives_core::StatusUpdate;

/// Metadata accompanying one file upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadMetadata {
    pub collection_id: String,
    pub is_publishable: bool,
    pub title: String,
    pub size_in_bytes: u64,
    pub mime_type: String,
    pub license: String,
    pub license_url: String,
    /// Destination directory, no leading slash.
    pub path: String,
    pub file_name: String,
}

impl UploadMetadata {
    /// `path/file_name`, the location the uploaded file resolves to.
    pub fn destination(&self) -> String {
        format!("{}/{}", self.path, self.file_name)
    }
}

/// Upload service: stores one file under a destination path.
#[async_trait]
pub trait UploadBackend: Send + Sync {
    async fn upload(&self, content: Bytes, metadata: &UploadMetadata) -> Result<(), ClientError>;

    async fn health_check(&self) -> Result<(), ClientError>;
}

/// Interactives catalog API: records the outcome of an import.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn update_import_status(
        &self,
        import_id: &str,
        update: &StatusUpdate,
    ) -> Result<(), ClientError>;

    async fn health_check(&self) -> Result<(), ClientError>;
}
