//! Interactives Importer
//!
//! Turns one "interactive uploaded" event into a versioned set of files in the
//! upload service plus a status update in the catalog:
//!
//! 1. fetch the zip from storage into a temporary file
//! 2. validate every entry ([`classifier`]) with a [`BatchProcessor`] pass
//! 3. upload every entry ([`UploadService`]) in a second pass, collecting the
//!    results on an [`ImportJob`]
//! 4. report success or failure once through the job
//!
//! Collaborators are reached through the `ArchiveStore`, `UploadBackend` and
//! `CatalogApi` traits so they can be swapped for the fakes in
//! [`test_helpers`].

pub mod archive;
pub mod batch;
pub mod classifier;
pub mod error;
pub mod handler;
pub mod job;
#[doc(hidden)]
pub mod test_helpers;
pub mod upload;

pub use archive::ArchiveEntry;
pub use batch::{BatchProcessor, EntryProcessor, ValidationProcessor};
pub use classifier::{classify, Classification};
pub use error::{BatchError, ImportError};
pub use handler::InteractivesUploadedHandler;
pub use job::{FinishGuard, ImportJob};
pub use upload::{FileUpload, UploadService};
