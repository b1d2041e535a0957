//! Zip archive and event fixtures.

use std::io::{Cursor, Write};
use tempfile::NamedTempFile;
use zip::write::{FileOptions, ZipWriter};
use zip::CompressionMethod;

/// One entry to place in a generated archive.
#[derive(Debug, Clone)]
pub enum ZipFixture {
    File { name: String, content: Vec<u8> },
    Dir { name: String },
    Symlink { name: String, target: String },
}

impl ZipFixture {
    pub fn file(name: &str, content: &[u8]) -> Self {
        ZipFixture::File {
            name: name.to_string(),
            content: content.to_vec(),
        }
    }

    pub fn dir(name: &str) -> Self {
        ZipFixture::Dir {
            name: name.to_string(),
        }
    }

    pub fn symlink(name: &str, target: &str) -> Self {
        ZipFixture::Symlink {
            name: name.to_string(),
            target: target.to_string(),
        }
    }
}

/// Build a zip archive in memory.
pub fn write_zip_bytes(entries: &[ZipFixture]) -> Vec<u8> {
    let mut buffer = Vec::new();
    {
        let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o644);

        for entry in entries {
            match entry {
                ZipFixture::File { name, content } => {
                    zip.start_file(name.as_str(), options)
                        .expect("failed to add file to zip");
                    zip.write_all(content).expect("failed to write zip entry");
                }
                ZipFixture::Dir { name } => {
                    zip.add_directory(name.as_str(), options)
                        .expect("failed to add directory to zip");
                }
                ZipFixture::Symlink { name, target } => {
                    zip.add_symlink(name.as_str(), target.as_str(), options)
                        .expect("failed to add symlink to zip");
                }
            }
        }

        zip.finish().expect("failed to finalize zip");
    }
    buffer
}

/// Build a zip archive in a temporary file.
pub fn write_zip(entries: &[ZipFixture]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("failed to create temp file");
    file.write_all(&write_zip_bytes(entries))
        .expect("failed to write zip");
    file.flush().expect("failed to flush zip");
    file
}

/// JSON body of an "interactives uploaded" message.
pub fn event_payload(id: &str, path: &str, current_files: &[&str]) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "collection_id": "collection-1",
        "id": id,
        "path": path,
        "title": format!("Interactive {}", id),
        "current_files": current_files,
    }))
    .expect("event serializes")
}
