//! In-memory archive store.

use async_trait::async_trait;
use bytes::Bytes;
use interactives_storage::{
    ArchiveStore, StorageBackend, StorageError, StorageResult, StoredObject,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Chunk size used when streaming stored objects back.
const CHUNK_SIZE: usize = 1024;

/// Archive store backed by a map, for tests.
#[derive(Clone, Default)]
pub struct MockArchiveStore {
    objects: Arc<Mutex<HashMap<String, Bytes>>>,
}

impl MockArchiveStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: &str, content: impl Into<Bytes>) {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), content.into());
    }
}

#[async_trait]
impl ArchiveStore for MockArchiveStore {
    async fn get(&self, key: &str) -> StorageResult<StoredObject> {
        let content = self
            .objects
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))?;

        let size = content.len() as u64;
        let chunks: Vec<StorageResult<Bytes>> = (0..content.len())
            .step_by(CHUNK_SIZE)
            .map(|start| Ok(content.slice(start..(start + CHUNK_SIZE).min(content.len()))))
            .collect();

        Ok(StoredObject {
            stream: Box::pin(futures::stream::iter(chunks)),
            size,
        })
    }

    async fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
