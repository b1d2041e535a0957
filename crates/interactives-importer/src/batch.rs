//! Bounded-concurrency walk over the entries of one archive.

use crate::archive::{open_archive, ArchiveEntry};
use crate::classifier::{classify, Classification};
use crate::{BatchError, ImportError};
use async_trait::async_trait;
use interactives_core::constants::PROGRESS_LOG_INTERVAL;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

/// Per-entry work run by [`BatchProcessor::process`].
///
/// `sequence` is unique within one run and starts at 1. Skipped entries never
/// reach the processor.
#[async_trait]
pub trait EntryProcessor: Send + Sync {
    async fn process(
        &self,
        sequence: u64,
        mime_type: &str,
        entry: &ArchiveEntry,
    ) -> Result<(), ImportError>;
}

/// Accepts every entry, logging progress. Used for the validation pass, which
/// only needs classification to succeed for every entry.
#[derive(Debug, Default, Clone, Copy)]
pub struct ValidationProcessor;

#[async_trait]
impl EntryProcessor for ValidationProcessor {
    async fn process(&self, sequence: u64, _: &str, _: &ArchiveEntry) -> Result<(), ImportError> {
        if sequence % PROGRESS_LOG_INTERVAL == 0 {
            tracing::info!(validated = sequence, "Validated archive entries");
        }
        Ok(())
    }
}

/// State shared by the tasks of one batch run.
#[derive(Debug, Default)]
struct BatchAggregator {
    counter: AtomicU64,
    errors: Mutex<Vec<ImportError>>,
}

impl BatchAggregator {
    fn next_sequence(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn record(&self, err: ImportError) {
        match self.errors.lock() {
            Ok(mut errors) => errors.push(err),
            Err(poisoned) => poisoned.into_inner().push(err),
        }
    }

    fn finish(&self) -> Result<u64, BatchError> {
        let count = self.counter.load(Ordering::SeqCst);
        let errors = match self.errors.lock() {
            Ok(mut errors) => std::mem::take(&mut *errors),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };

        if errors.is_empty() {
            Ok(count)
        } else {
            Err(BatchError::new(errors))
        }
    }
}

/// Runs an [`EntryProcessor`] over every importable entry of an archive with
/// at most `concurrency_limit` entries in flight.
#[derive(Debug, Clone, Copy)]
pub struct BatchProcessor {
    concurrency_limit: usize,
}

impl BatchProcessor {
    pub fn new(concurrency_limit: usize) -> Self {
        Self {
            concurrency_limit: concurrency_limit.max(1),
        }
    }

    /// Process the archive at `archive_path`, returning the number of entries
    /// handed to `processor`.
    ///
    /// Failure to open the archive is returned straight away. Every other
    /// error (classification or processor) is collected while the remaining
    /// entries carry on, and all of them come back together as one
    /// [`ImportError::Batch`].
    pub async fn process(
        &self,
        archive_path: &Path,
        processor: Arc<dyn EntryProcessor>,
    ) -> Result<u64, ImportError> {
        let entries = open_archive(archive_path).await?;

        tracing::debug!(
            archive = %archive_path.display(),
            entries = entries.len(),
            concurrency_limit = self.concurrency_limit,
            "Processing archive entries"
        );

        let semaphore = Arc::new(Semaphore::new(self.concurrency_limit));
        let aggregator = Arc::new(BatchAggregator::default());
        let mut handles = Vec::with_capacity(entries.len());

        for entry in entries {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| ImportError::Task(e.to_string()))?;
            let aggregator = aggregator.clone();
            let processor = processor.clone();

            handles.push(tokio::spawn(async move {
                let _permit = permit;
                if let Err(e) = process_entry(&entry, processor.as_ref(), &aggregator).await {
                    tracing::debug!(entry = %entry.name(), error = %e, "Entry failed");
                    aggregator.record(e);
                }
            }));
        }

        for handle in handles {
            if let Err(e) = handle.await {
                aggregator.record(e.into());
            }
        }

        aggregator.finish().map_err(ImportError::from)
    }
}

async fn process_entry(
    entry: &ArchiveEntry,
    processor: &dyn EntryProcessor,
    aggregator: &BatchAggregator,
) -> Result<(), ImportError> {
    match classify(entry).await? {
        Classification::Skip => Ok(()),
        Classification::Accept { mime_type } => {
            let sequence = aggregator.next_sequence();
            processor.process(sequence, &mime_type, entry).await
        }
    }
}
