//! Interactives Core Library
//!
//! This crate provides the domain models, constants and configuration shared by
//! every interactives importer component.

pub mod config;
pub mod constants;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{Config, ImporterConfig};
pub use models::{ArchiveStatus, ImportEvent, StatusUpdate, UploadedFileRecord};
pub use storage_types::StorageBackend;
