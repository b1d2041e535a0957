//! Versioned uploads of single archive entries.

use crate::ImportError;
use bytes::Bytes;
use interactives_api_client::{UploadBackend, UploadMetadata};
use interactives_core::constants::{LICENSE_NAME, LICENSE_URL, MAX_UPLOAD_ATTEMPTS};
use interactives_core::ImportEvent;
use regex::Regex;
use std::sync::{Arc, LazyLock};

static VERSION_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/version-(\d+)/").expect("version pattern is valid"));

/// An archive entry ready to send.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub name: String,
    pub size_in_bytes: u64,
    pub mime_type: String,
    /// Buffered once so it can be re-sent on a version retry.
    pub content: Bytes,
}

/// Sends entries to the upload backend under `<root>/version-<n>/<name>`,
/// bumping `n` while the backend reports the path as taken.
#[derive(Clone)]
pub struct UploadService {
    backend: Arc<dyn UploadBackend>,
}

impl UploadService {
    pub fn new(backend: Arc<dyn UploadBackend>) -> Self {
        Self { backend }
    }

    /// Upload `file` and return the destination it was stored at.
    pub async fn send_file(
        &self,
        event: &ImportEvent,
        file: &FileUpload,
        upload_root: &str,
    ) -> Result<String, ImportError> {
        let mut version = initial_version(&event.current_files, &file.name)?;
        let mut attempt: u32 = 1;

        loop {
            let metadata = build_metadata(event, file, upload_root, version);

            match self.backend.upload(file.content.clone(), &metadata).await {
                Ok(()) => return Ok(metadata.destination()),
                Err(e) if e.is_duplicate_file() => {
                    if attempt >= MAX_UPLOAD_ATTEMPTS {
                        tracing::warn!(
                            entry = %file.name,
                            attempts = attempt,
                            "Exhausted attempts to upload file"
                        );
                        return Err(ImportError::UploadAttemptsExhausted {
                            entry: file.name.clone(),
                            attempts: attempt,
                            source: e,
                        });
                    }
                    tracing::debug!(
                        entry = %file.name,
                        version,
                        attempt,
                        "Destination already exists, retrying with next version"
                    );
                    version = next_version(version, &file.name)?;
                    attempt += 1;
                }
                Err(e) => return Err(ImportError::Upload(e)),
            }
        }
    }
}

/// 1, or one past the highest version of a previous upload of the same entry.
pub fn initial_version(current_files: &[String], entry_name: &str) -> Result<u64, ImportError> {
    let mut latest: Option<u64> = None;
    for existing in current_files.iter().filter(|f| f.ends_with(entry_name)) {
        let Some(captures) = VERSION_SEGMENT.captures(existing) else {
            continue;
        };
        let seen = captures[1]
            .parse::<u64>()
            .map_err(|_| ImportError::VersionOutOfRange {
                entry: entry_name.to_string(),
                version: captures[1].to_string(),
            })?;
        latest = latest.max(Some(seen));
    }

    match latest {
        Some(seen) => next_version(seen, entry_name),
        None => Ok(1),
    }
}

fn next_version(version: u64, entry_name: &str) -> Result<u64, ImportError> {
    version
        .checked_add(1)
        .ok_or_else(|| ImportError::VersionOutOfRange {
            entry: entry_name.to_string(),
            version: version.to_string(),
        })
}

fn build_metadata(
    event: &ImportEvent,
    file: &FileUpload,
    upload_root: &str,
    version: u64,
) -> UploadMetadata {
    UploadMetadata {
        collection_id: event.collection_id.clone(),
        is_publishable: true,
        title: event.title.clone(),
        size_in_bytes: file.size_in_bytes,
        mime_type: file.mime_type.clone(),
        license: LICENSE_NAME.to_string(),
        license_url: LICENSE_URL.to_string(),
        path: format!("{}/version-{}", upload_root, version),
        file_name: file.name.clone(),
    }
}
