//! Interactives Storage Library
//!
//! This crate provides the read side of archive storage: the `ArchiveStore`
//! trait the importer fetches zips through, and implementations for S3 and the
//! local filesystem.
//!
//! Keys are the `path` carried by an import event. They must not contain `..`
//! or a leading `/`.

pub mod factory;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use interactives_core::StorageBackend;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{ArchiveStore, ByteStream, StorageError, StorageResult, StoredObject};
