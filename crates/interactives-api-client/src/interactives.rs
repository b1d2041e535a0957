//! Interactives catalog API client.

use crate::{ApiClient, CatalogApi, ClientError};
use async_trait::async_trait;
use interactives_core::{ArchiveStatus, StatusUpdate, UploadedFileRecord};
use serde::Serialize;
use std::time::Duration;

const SERVICE: &str = "interactives-api";

/// Patch attribute selecting the archive sub-document.
const PATCH_ARCHIVE: &str = "Archive";

#[derive(Debug, Serialize)]
struct PatchRequest<'a> {
    attribute: &'static str,
    interactive: PatchInteractive<'a>,
}

#[derive(Debug, Serialize)]
struct PatchInteractive<'a> {
    id: &'a str,
    archive: PatchArchive<'a>,
}

#[derive(Debug, Serialize)]
struct PatchArchive<'a> {
    name: &'a str,
    import_successful: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    import_message: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    size_in_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    files: Vec<PatchFile<'a>>,
}

#[derive(Debug, Serialize)]
struct PatchFile<'a> {
    name: &'a str,
    size_in_bytes: u64,
    mimetype: &'a str,
    uri: &'a str,
}

// `name` is where the file was uploaded to, `uri` the path inside the zip.
impl<'a> From<&'a UploadedFileRecord> for PatchFile<'a> {
    fn from(file: &'a UploadedFileRecord) -> Self {
        Self {
            name: &file.destination_path,
            size_in_bytes: file.size_in_bytes,
            mimetype: &file.mime_type,
            uri: &file.source_entry_name,
        }
    }
}

impl<'a> PatchRequest<'a> {
    fn from_update(update: &'a StatusUpdate) -> Self {
        let archive = match &update.status {
            ArchiveStatus::Succeeded {
                size_in_bytes,
                files,
            } => PatchArchive {
                name: &update.archive_name,
                import_successful: true,
                import_message: None,
                size_in_bytes: *size_in_bytes,
                files: files.iter().map(PatchFile::from).collect(),
            },
            ArchiveStatus::Failed { message } => PatchArchive {
                name: &update.archive_name,
                import_successful: false,
                import_message: Some(message),
                size_in_bytes: None,
                files: Vec::new(),
            },
        };

        Self {
            attribute: PATCH_ARCHIVE,
            interactive: PatchInteractive {
                id: &update.import_id,
                archive,
            },
        }
    }
}

/// Client for `PATCH /v1/interactives/{id}`.
#[derive(Clone, Debug)]
pub struct InteractivesApiClient {
    api: ApiClient,
}

impl InteractivesApiClient {
    pub fn new(
        base_url: &str,
        service_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        Ok(Self {
            api: ApiClient::new(SERVICE, base_url, service_token, timeout)?,
        })
    }
}

#[async_trait]
impl CatalogApi for InteractivesApiClient {
    async fn update_import_status(
        &self,
        import_id: &str,
        update: &StatusUpdate,
    ) -> Result<(), ClientError> {
        let uri = self.api.build_url(&format!("/v1/interactives/{}", import_id));
        let body = PatchRequest::from_update(update);
        let request = self.api.client().patch(&uri).json(&body);

        self.api.send(&uri, request).await?;

        tracing::debug!(
            uri = %uri,
            import_id = %import_id,
            success = update.is_success(),
            "Interactive archive status updated"
        );
        Ok(())
    }

    async fn health_check(&self) -> Result<(), ClientError> {
        self.api.health().await
    }
}
