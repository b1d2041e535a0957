//! Domain models
//!
//! Models shared between the importer, its collaborators and the queue consumer.

pub mod archive;
pub mod event;

pub use archive::{ArchiveStatus, StatusUpdate, UploadedFileRecord};
pub use event::ImportEvent;
