use serde::{Deserialize, Serialize};

/// A file from the archive that the upload service accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFileRecord {
    /// `<root>/version-<n>/<entry name>`, resolvable through the upload service.
    pub destination_path: String,
    pub size_in_bytes: u64,
    pub mime_type: String,
    /// Path of the entry inside the zip.
    pub source_entry_name: String,
}

/// Outcome of one import as reported to the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveStatus {
    Succeeded {
        size_in_bytes: Option<u64>,
        files: Vec<UploadedFileRecord>,
    },
    Failed {
        message: String,
    },
}

/// Status update sent to the catalog API once per import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub import_id: String,
    /// Storage key of the archive the import was run against.
    pub archive_name: String,
    pub status: ArchiveStatus,
}

impl StatusUpdate {
    pub fn succeeded(
        import_id: impl Into<String>,
        archive_name: impl Into<String>,
        size_in_bytes: Option<u64>,
        files: Vec<UploadedFileRecord>,
    ) -> Self {
        Self {
            import_id: import_id.into(),
            archive_name: archive_name.into(),
            status: ArchiveStatus::Succeeded {
                size_in_bytes,
                files,
            },
        }
    }

    pub fn failed(
        import_id: impl Into<String>,
        archive_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            import_id: import_id.into(),
            archive_name: archive_name.into(),
            status: ArchiveStatus::Failed {
                message: message.into(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, ArchiveStatus::Succeeded { .. })
    }

    pub fn files(&self) -> &[UploadedFileRecord] {
        match &self.status {
            ArchiveStatus::Succeeded { files, .. } => files,
            ArchiveStatus::Failed { .. } => &[],
        }
    }

    pub fn message(&self) -> Option<&str> {
        match &self.status {
            ArchiveStatus::Failed { message } => Some(message),
            ArchiveStatus::Succeeded { .. } => None,
        }
    }
}
