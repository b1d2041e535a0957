//! Handles one "interactives uploaded" event end to end.

use crate::archive::ArchiveEntry;
use crate::batch::{BatchProcessor, EntryProcessor, ValidationProcessor};
use crate::job::ImportJob;
use crate::upload::{FileUpload, UploadService};
use crate::ImportError;
use async_trait::async_trait;
use futures::StreamExt;
use interactives_api_client::CatalogApi;
use interactives_core::constants::{
    PROGRESS_LOG_INTERVAL, RANDOM_SUFFIX_LENGTH, UPLOAD_ROOT_DIRECTORY,
};
use interactives_core::{ImportEvent, UploadedFileRecord};
use interactives_storage::{ArchiveStore, ByteStream};
use rand::Rng;
use std::sync::Arc;
use std::time::Instant;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tracing::Instrument;

/// Imports the archive named by an event and reports the outcome.
#[derive(Clone)]
pub struct InteractivesUploadedHandler {
    storage: Arc<dyn ArchiveStore>,
    upload_service: UploadService,
    catalog: Arc<dyn CatalogApi>,
    batch_size: usize,
}

impl InteractivesUploadedHandler {
    pub fn new(
        storage: Arc<dyn ArchiveStore>,
        upload_service: UploadService,
        catalog: Arc<dyn CatalogApi>,
        batch_size: usize,
    ) -> Self {
        Self {
            storage,
            upload_service,
            catalog,
            batch_size,
        }
    }

    /// Decode `payload` and import the archive it points at.
    ///
    /// An undecodable payload is returned as an error without reporting to the
    /// catalog. Once decoded, the catalog receives exactly one status update.
    pub async fn handle(&self, payload: &[u8]) -> Result<(), ImportError> {
        let event = ImportEvent::from_slice(payload).map_err(|e| {
            tracing::error!(error = %e, "Cannot unmarshal message into an event");
            ImportError::Decode(e)
        })?;

        let span = tracing::info_span!(
            "import",
            import_id = %event.id,
            path = %event.source_path,
            title = %event.title,
        );
        self.import(event).instrument(span).await
    }

    async fn import(&self, event: ImportEvent) -> Result<(), ImportError> {
        let start = Instant::now();
        tracing::info!("Event received");

        let upload_root = upload_root_path(&event.id);
        let job = Arc::new(ImportJob::new(self.catalog.clone()));
        let guard = job.guard(event.clone());

        let mut zip_size = None;
        let result = self.run(&event, &upload_root, &job, &mut zip_size).await;
        guard.finish(zip_size, result.as_ref().err()).await;

        match &result {
            Ok(uploaded) => tracing::info!(
                uploaded_files = uploaded,
                zip_size = ?zip_size,
                duration_ms = start.elapsed().as_millis(),
                "Successfully processed"
            ),
            Err(e) => tracing::error!(
                error = %e,
                duration_ms = start.elapsed().as_millis(),
                "Import failed"
            ),
        }

        result.map(drop)
    }

    async fn run(
        &self,
        event: &ImportEvent,
        upload_root: &str,
        job: &Arc<ImportJob>,
        zip_size: &mut Option<u64>,
    ) -> Result<u64, ImportError> {
        tracing::info!("Downloading zip file from storage");
        let object = self.storage.get(&event.source_path).await?;
        *zip_size = Some(object.size);

        let archive = materialize(object.stream).await?;
        let batch = BatchProcessor::new(self.batch_size);

        tracing::info!(zip_size = object.size, "Validating zip");
        let entries = batch
            .process(archive.path(), Arc::new(ValidationProcessor))
            .await?;

        tracing::info!(entries, upload_root = %upload_root, "Starting upload of zip files");
        let uploader = Arc::new(UploadProcessor {
            event: event.clone(),
            upload_root: upload_root.to_string(),
            upload_service: self.upload_service.clone(),
            job: job.clone(),
        });
        batch.process(archive.path(), uploader).await
    }
}

/// Uploads accepted entries and records them on the job.
struct UploadProcessor {
    event: ImportEvent,
    upload_root: String,
    upload_service: UploadService,
    job: Arc<ImportJob>,
}

#[async_trait]
impl EntryProcessor for UploadProcessor {
    async fn process(
        &self,
        sequence: u64,
        mime_type: &str,
        entry: &ArchiveEntry,
    ) -> Result<(), ImportError> {
        if sequence % PROGRESS_LOG_INTERVAL == 0 {
            tracing::info!(uploaded = sequence, "Uploading archive entries");
        }

        let content = entry.read_bytes().await?;
        let file = FileUpload {
            name: entry.name().to_string(),
            size_in_bytes: content.len() as u64,
            mime_type: mime_type.to_string(),
            content,
        };

        let destination = self
            .upload_service
            .send_file(&self.event, &file, &self.upload_root)
            .await?;

        self.job.add(UploadedFileRecord {
            destination_path: destination,
            size_in_bytes: file.size_in_bytes,
            mime_type: file.mime_type,
            source_entry_name: file.name,
        });
        Ok(())
    }
}

/// `interactives/<id>/<random>`, unique per import so concurrent re-imports
/// of the same interactive never collide.
pub fn upload_root_path(import_id: &str) -> String {
    let suffix: String = rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(RANDOM_SUFFIX_LENGTH)
        .map(char::from)
        .collect();
    format!("{}/{}/{}", UPLOAD_ROOT_DIRECTORY, import_id, suffix)
}

/// Copy the archive stream to a temporary file, removed when dropped.
async fn materialize(mut stream: ByteStream) -> Result<NamedTempFile, ImportError> {
    let temp = tempfile::Builder::new()
        .prefix("interactives-zip_")
        .suffix(".zip")
        .tempfile()?;
    let mut file = tokio::fs::File::from_std(temp.as_file().try_clone()?);

    while let Some(chunk) = stream.next().await {
        file.write_all(&chunk?).await?;
    }
    file.flush().await?;

    Ok(temp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{
        event_payload, write_zip_bytes, MockArchiveStore, MockCatalogApi, MockUploadBackend,
        ZipFixture,
    };

    struct Harness {
        storage: Arc<MockArchiveStore>,
        uploads: Arc<MockUploadBackend>,
        catalog: Arc<MockCatalogApi>,
        handler: InteractivesUploadedHandler,
    }

    fn harness(uploads: MockUploadBackend) -> Harness {
        let storage = Arc::new(MockArchiveStore::new());
        let uploads = Arc::new(uploads);
        let catalog = Arc::new(MockCatalogApi::new());
        let handler = InteractivesUploadedHandler::new(
            storage.clone(),
            UploadService::new(uploads.clone()),
            catalog.clone(),
            4,
        );
        Harness {
            storage,
            uploads,
            catalog,
            handler,
        }
    }

    #[test]
    fn test_upload_root_path_shape() {
        let root = upload_root_path("abc");
        let parts: Vec<_> = root.split('/').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "interactives");
        assert_eq!(parts[1], "abc");
        assert_eq!(parts[2].len(), RANDOM_SUFFIX_LENGTH);
        assert!(parts[2].chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(root, upload_root_path("abc"));
    }

    #[tokio::test]
    async fn test_undecodable_message_is_not_reported() {
        let h = harness(MockUploadBackend::new());

        let err = h.handler.handle(b"{not json").await.unwrap_err();

        assert!(matches!(err, ImportError::Decode(_)));
        assert_eq!(h.catalog.attempts(), 0);
    }

    #[tokio::test]
    async fn test_missing_archive_reports_failure() {
        let h = harness(MockUploadBackend::new());

        let err = h
            .handler
            .handle(&event_payload("abc", "uploads/missing.zip", &[]))
            .await
            .unwrap_err();

        assert!(matches!(err, ImportError::Storage(_)));
        let updates = h.catalog.updates();
        assert_eq!(updates.len(), 1);
        assert!(!updates[0].1.is_success());
        assert_eq!(updates[0].1.message(), Some(err.to_string().as_str()));
        assert!(h.uploads.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unclassifiable_entry_fails_before_any_upload() {
        let h = harness(MockUploadBackend::new());
        h.storage.insert(
            "uploads/abc.zip",
            write_zip_bytes(&[
                ZipFixture::file("index.html", b"<html></html>"),
                ZipFixture::file("mystery", b"no magic"),
            ]),
        );

        let err = h
            .handler
            .handle(&event_payload("abc", "uploads/abc.zip", &[]))
            .await
            .unwrap_err();

        assert!(matches!(err, ImportError::Batch(_)));
        assert!(h.uploads.calls().is_empty());
        let updates = h.catalog.updates();
        assert_eq!(updates.len(), 1);
        assert!(updates[0].1.message().unwrap().contains("mystery"));
    }

    #[tokio::test]
    async fn test_upload_failure_reports_failure_once() {
        let h = harness(MockUploadBackend::new().always_fail("storage offline"));
        h.storage.insert(
            "uploads/abc.zip",
            write_zip_bytes(&[
                ZipFixture::file("index.html", b"<html></html>"),
                ZipFixture::file("app.js", b"console.log(1)"),
            ]),
        );

        let err = h
            .handler
            .handle(&event_payload("abc", "uploads/abc.zip", &[]))
            .await
            .unwrap_err();

        match err {
            ImportError::Batch(batch) => assert_eq!(batch.count(), 2),
            other => panic!("expected batch error, got {:?}", other),
        }
        let updates = h.catalog.updates();
        assert_eq!(updates.len(), 1);
        assert!(!updates[0].1.is_success());
        assert!(updates[0].1.files().is_empty());
    }

    #[tokio::test]
    async fn test_success_reports_manifest_with_zip_size() {
        let h = harness(MockUploadBackend::new());
        let zip = write_zip_bytes(&[
            ZipFixture::file("index.html", b"<html></html>"),
            ZipFixture::file("data/areas.geojson", b"{}"),
        ]);
        let zip_len = zip.len() as u64;
        h.storage.insert("uploads/abc.zip", zip);

        h.handler
            .handle(&event_payload("abc", "uploads/abc.zip", &[]))
            .await
            .unwrap();

        let updates = h.catalog.updates();
        assert_eq!(updates.len(), 1);
        let update = &updates[0].1;
        assert!(update.is_success());
        assert_eq!(
            update.status,
            interactives_core::ArchiveStatus::Succeeded {
                size_in_bytes: Some(zip_len),
                files: update.files().to_vec(),
            }
        );

        let mut files = update.files().to_vec();
        files.sort_by(|a, b| a.source_entry_name.cmp(&b.source_entry_name));
        assert_eq!(files[0].source_entry_name, "data/areas.geojson");
        assert_eq!(files[0].mime_type, "application/geo+json");
        assert!(files[0].destination_path.starts_with("interactives/abc/"));
        assert!(files[0]
            .destination_path
            .ends_with("/version-1/data/areas.geojson"));
        assert_eq!(files[1].size_in_bytes, 13);
    }
}
