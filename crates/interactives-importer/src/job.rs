//! Per-import accumulation of uploaded files and the final status report.

use crate::ImportError;
use interactives_api_client::CatalogApi;
use interactives_core::{ImportEvent, StatusUpdate, UploadedFileRecord};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Collects the files uploaded for one import and reports the outcome to the
/// catalog exactly once.
pub struct ImportJob {
    catalog: Arc<dyn CatalogApi>,
    files: Mutex<Vec<UploadedFileRecord>>,
    finished: AtomicBool,
}

impl ImportJob {
    pub fn new(catalog: Arc<dyn CatalogApi>) -> Self {
        Self {
            catalog,
            files: Mutex::new(Vec::new()),
            finished: AtomicBool::new(false),
        }
    }

    pub fn add(&self, record: UploadedFileRecord) {
        match self.files.lock() {
            Ok(mut files) => files.push(record),
            Err(poisoned) => poisoned.into_inner().push(record),
        }
    }

    /// Snapshot of the uploaded files, in completion order.
    pub fn files(&self) -> Vec<UploadedFileRecord> {
        match self.files.lock() {
            Ok(files) => files.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }

    /// Build the status update for this outcome.
    ///
    /// A failed import reports only the error message; files uploaded before
    /// the failure are left out.
    pub fn status_update(
        &self,
        event: &ImportEvent,
        zip_size: Option<u64>,
        error: Option<&ImportError>,
    ) -> StatusUpdate {
        match error {
            Some(err) => StatusUpdate::failed(&event.id, &event.source_path, err.to_string()),
            None => StatusUpdate::succeeded(&event.id, &event.source_path, zip_size, self.files()),
        }
    }

    /// Report the outcome to the catalog. Only the first call sends anything.
    ///
    /// Catalog failures are logged and otherwise ignored.
    pub async fn finish(
        &self,
        event: &ImportEvent,
        zip_size: Option<u64>,
        error: Option<&ImportError>,
    ) {
        if self.finished.swap(true, Ordering::SeqCst) {
            tracing::warn!(import_id = %event.id, "Import job already finished");
            return;
        }

        let update = self.status_update(event, zip_size, error);

        if let Err(e) = self.catalog.update_import_status(&event.id, &update).await {
            tracing::warn!(
                import_id = %event.id,
                path = %event.source_path,
                import_error = ?error.map(|e| e.to_string()),
                api_error = %e,
                "Failed to update interactive"
            );
        }
    }

    /// Arm a guard that reports a failure if the import is abandoned before
    /// [`FinishGuard::finish`] runs.
    pub fn guard(self: &Arc<Self>, event: ImportEvent) -> FinishGuard {
        FinishGuard {
            job: self.clone(),
            event: Some(event),
        }
    }
}

/// Ensures an [`ImportJob`] is finished on every exit path.
///
/// Dropping the guard without calling [`finish`](Self::finish) (a panic, or
/// the handler future being cancelled) reports the import as failed from a
/// background task.
///
/// The fallback is best effort. Release builds abort on panic, so only
/// cancellation reaches it there. A report spawned while the runtime is
/// shutting down may never run; that import stays unreported.
pub struct FinishGuard {
    job: Arc<ImportJob>,
    event: Option<ImportEvent>,
}

impl FinishGuard {
    pub async fn finish(mut self, zip_size: Option<u64>, error: Option<&ImportError>) {
        if let Some(event) = self.event.take() {
            self.job.finish(&event, zip_size, error).await;
        }
    }
}

impl Drop for FinishGuard {
    fn drop(&mut self) {
        let Some(event) = self.event.take() else {
            return;
        };
        if self.job.is_finished() {
            return;
        }

        let job = self.job.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    let err = ImportError::Task("import abandoned before completion".to_string());
                    job.finish(&event, None, Some(&err)).await;
                });
            }
            Err(_) => {
                tracing::error!(import_id = %event.id, "Import abandoned outside a runtime, status not reported");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::MockCatalogApi;

    fn event() -> ImportEvent {
        ImportEvent {
            id: "abc".to_string(),
            collection_id: "col".to_string(),
            source_path: "uploads/abc.zip".to_string(),
            title: "Title".to_string(),
            current_files: vec![],
        }
    }

    fn record(i: usize) -> UploadedFileRecord {
        UploadedFileRecord {
            destination_path: format!("interactives/abc/r/version-1/{}.css", i),
            size_in_bytes: i as u64,
            mime_type: "text/css".to_string(),
            source_entry_name: format!("{}.css", i),
        }
    }

    #[tokio::test]
    async fn test_concurrent_adds_are_all_kept() {
        let job = Arc::new(ImportJob::new(Arc::new(MockCatalogApi::new())));

        let handles: Vec<_> = (0..1000)
            .map(|i| {
                let job = job.clone();
                tokio::spawn(async move { job.add(record(i)) })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        let files = job.files();
        assert_eq!(files.len(), 1000);
        let mut names: Vec<_> = files.into_iter().map(|f| f.source_entry_name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 1000);
    }

    #[tokio::test]
    async fn test_success_reports_files_and_size() {
        let catalog = Arc::new(MockCatalogApi::new());
        let job = ImportJob::new(catalog.clone());
        job.add(record(1));
        job.add(record(2));

        job.finish(&event(), Some(1234), None).await;

        let updates = catalog.updates();
        assert_eq!(updates.len(), 1);
        let (id, update) = &updates[0];
        assert_eq!(id, "abc");
        assert!(update.is_success());
        assert_eq!(update.archive_name, "uploads/abc.zip");
        assert_eq!(update.files().len(), 2);
        assert_eq!(
            update.status,
            interactives_core::ArchiveStatus::Succeeded {
                size_in_bytes: Some(1234),
                files: vec![record(1), record(2)],
            }
        );
    }

    #[tokio::test]
    async fn test_failure_discards_partial_manifest() {
        let catalog = Arc::new(MockCatalogApi::new());
        let job = ImportJob::new(catalog.clone());
        job.add(record(1));

        let err = ImportError::UnknownMimeType {
            entry: "blob".to_string(),
        };
        job.finish(&event(), Some(10), Some(&err)).await;

        let updates = catalog.updates();
        assert_eq!(updates.len(), 1);
        let update = &updates[0].1;
        assert!(!update.is_success());
        assert!(update.files().is_empty());
        assert_eq!(update.message(), Some(err.to_string().as_str()));
    }

    #[tokio::test]
    async fn test_finish_sends_once() {
        let catalog = Arc::new(MockCatalogApi::new());
        let job = ImportJob::new(catalog.clone());

        job.finish(&event(), None, None).await;
        job.finish(&event(), None, None).await;

        assert_eq!(catalog.updates().len(), 1);
    }

    #[tokio::test]
    async fn test_catalog_failure_is_swallowed() {
        let catalog = Arc::new(MockCatalogApi::new().failing());
        let job = ImportJob::new(catalog.clone());

        job.finish(&event(), None, None).await;

        assert_eq!(catalog.attempts(), 1);
        assert!(job.is_finished());
    }

    #[tokio::test]
    async fn test_dropped_guard_reports_failure() {
        let catalog = Arc::new(MockCatalogApi::new());
        let job = Arc::new(ImportJob::new(catalog.clone()));

        drop(job.guard(event()));

        for _ in 0..50 {
            if !catalog.updates().is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        let updates = catalog.updates();
        assert_eq!(updates.len(), 1);
        assert!(!updates[0].1.is_success());
    }

    #[tokio::test]
    async fn test_cancelled_import_reports_failure() {
        let catalog = Arc::new(MockCatalogApi::new());
        let job = Arc::new(ImportJob::new(catalog.clone()));

        let guard = job.guard(event());
        let task = tokio::spawn(async move {
            let _guard = guard;
            std::future::pending::<()>().await;
        });
        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());

        for _ in 0..50 {
            if !catalog.updates().is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        let updates = catalog.updates();
        assert_eq!(updates.len(), 1);
        assert!(!updates[0].1.is_success());
        assert!(job.is_finished());
    }

    #[tokio::test]
    async fn test_finished_guard_does_not_report_again() {
        let catalog = Arc::new(MockCatalogApi::new());
        let job = Arc::new(ImportJob::new(catalog.clone()));

        job.guard(event()).finish(Some(1), None).await;
        tokio::task::yield_now().await;

        assert_eq!(catalog.updates().len(), 1);
    }
}
