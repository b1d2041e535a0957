//! Test helpers for importer unit and integration tests
//!
//! In-memory implementations of the storage, upload and catalog capabilities,
//! plus zip and event fixtures. No network or cloud access is needed.

pub mod fixtures;
pub mod mock_clients;
pub mod mock_storage;

pub use fixtures::*;
pub use mock_clients::*;
pub use mock_storage::*;
