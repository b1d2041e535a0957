//! Random-access reading of a zip archive on local disk.
//!
//! The archive is opened once per batch run. Entry metadata is read up front;
//! entry contents are read on demand, so an entry can be read any number of
//! times (sniffing, then uploading, then again on a version retry).

use crate::ImportError;
use bytes::Bytes;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use zip::ZipArchive;

const S_IFMT: u32 = 0o170000;
const S_IFREG: u32 = 0o100000;

/// Cap on the up-front buffer reservation; the declared size is untrusted.
const MAX_PREALLOC: usize = 64 * 1024 * 1024;

type SharedZip = Arc<Mutex<ZipArchive<File>>>;

/// One entry of an opened archive.
#[derive(Clone)]
pub struct ArchiveEntry {
    archive: SharedZip,
    index: usize,
    name: String,
    size_in_bytes: u64,
    is_regular_file: bool,
}

impl std::fmt::Debug for ArchiveEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveEntry")
            .field("index", &self.index)
            .field("name", &self.name)
            .field("size_in_bytes", &self.size_in_bytes)
            .field("is_regular_file", &self.is_regular_file)
            .finish()
    }
}

impl ArchiveEntry {
    /// Path of the entry inside the archive.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Uncompressed size.
    pub fn size_in_bytes(&self) -> u64 {
        self.size_in_bytes
    }

    /// False for directories, symlinks and other special entries.
    pub fn is_regular_file(&self) -> bool {
        self.is_regular_file
    }

    /// Read the whole entry.
    pub async fn read_bytes(&self) -> Result<Bytes, ImportError> {
        let capacity = usize::try_from(self.size_in_bytes)
            .unwrap_or(MAX_PREALLOC)
            .min(MAX_PREALLOC);
        self.read_with(move |reader| {
            let mut buf = Vec::with_capacity(capacity);
            reader.read_to_end(&mut buf)?;
            Ok(Bytes::from(buf))
        })
        .await
    }

    /// Read at most `limit` bytes from the start of the entry.
    pub async fn read_prefix(&self, limit: usize) -> Result<Vec<u8>, ImportError> {
        self.read_with(move |reader| {
            let mut buf = Vec::with_capacity(limit);
            reader.take(limit as u64).read_to_end(&mut buf)?;
            Ok(buf)
        })
        .await
    }

    async fn read_with<T, F>(&self, read: F) -> Result<T, ImportError>
    where
        T: Send + 'static,
        F: FnOnce(&mut dyn Read) -> Result<T, ImportError> + Send + 'static,
    {
        let archive = self.archive.clone();
        let index = self.index;

        tokio::task::spawn_blocking(move || {
            let mut archive = archive
                .lock()
                .map_err(|_| ImportError::Task("archive lock poisoned".to_string()))?;
            let mut file = archive.by_index(index)?;
            read(&mut file)
        })
        .await?
    }
}

/// Open the zip at `path` and list its entries in archive order.
///
/// Corrupt or non-zip content fails here, before any entry is touched.
pub async fn open_archive(path: &Path) -> Result<Vec<ArchiveEntry>, ImportError> {
    let path: PathBuf = path.to_path_buf();

    tokio::task::spawn_blocking(move || {
        let file = File::open(&path)?;
        let mut archive = ZipArchive::new(file)?;

        let mut listing = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let file = archive.by_index_raw(index)?;
            let is_regular_file = !file.is_dir()
                && file
                    .unix_mode()
                    .map(|mode| mode & S_IFMT == 0 || mode & S_IFMT == S_IFREG)
                    .unwrap_or(true);
            listing.push((index, file.name().to_string(), file.size(), is_regular_file));
        }

        let shared = Arc::new(Mutex::new(archive));
        Ok(listing
            .into_iter()
            .map(|(index, name, size_in_bytes, is_regular_file)| ArchiveEntry {
                archive: shared.clone(),
                index,
                name,
                size_in_bytes,
                is_regular_file,
            })
            .collect())
    })
    .await?
}
