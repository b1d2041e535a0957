use interactives_api_client::ClientError;
use interactives_storage::StorageError;
use std::fmt;
use thiserror::Error;

/// Errors raised while importing one archive.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("cannot decode event: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("cannot get zip from storage: {0}")]
    Storage(#[from] StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot open archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("cannot determine mime type: {entry} type unknown")]
    UnknownMimeType { entry: String },

    #[error("upload failed: {0}")]
    Upload(#[from] ClientError),

    #[error("exhausted attempts to upload file {entry} after {attempts} attempts: {source}")]
    UploadAttemptsExhausted {
        entry: String,
        attempts: u32,
        #[source]
        source: ClientError,
    },

    #[error("cannot pick a version for {entry}: version {version} is out of range")]
    VersionOutOfRange { entry: String, version: String },

    #[error(transparent)]
    Batch(#[from] BatchError),

    /// A worker task panicked or was cancelled.
    #[error("task failed: {0}")]
    Task(String),
}

impl From<tokio::task::JoinError> for ImportError {
    fn from(err: tokio::task::JoinError) -> Self {
        ImportError::Task(err.to_string())
    }
}

/// Every error collected during one batch run.
#[derive(Debug)]
pub struct BatchError {
    errors: Vec<ImportError>,
}

impl BatchError {
    pub fn new(errors: Vec<ImportError>) -> Self {
        Self { errors }
    }

    pub fn count(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[ImportError] {
        &self.errors
    }
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let noun = if self.errors.len() == 1 { "error" } else { "errors" };
        write!(f, "{} {} occurred:", self.errors.len(), noun)?;
        for err in &self.errors {
            write!(f, "\n\t* {}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for BatchError {}
