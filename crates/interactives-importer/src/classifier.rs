//! Decides which archive entries are imported and with what content type.

use crate::archive::ArchiveEntry;
use crate::ImportError;
use interactives_core::constants::GEOJSON_MIME_TYPE;
use std::path::Path;

/// Bytes read from an entry when its extension gives no content type.
const SNIFF_LEN: usize = 262;

/// Outcome of classifying one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Not imported and not counted.
    Skip,
    Accept { mime_type: String },
}

/// Classify an entry, sniffing its content when the extension is not enough.
pub async fn classify(entry: &ArchiveEntry) -> Result<Classification, ImportError> {
    if is_ignored(entry.name(), entry.is_regular_file()) {
        return Ok(Classification::Skip);
    }

    if let Some(mime_type) = mime_type_from_name(entry.name()) {
        return Ok(Classification::Accept { mime_type });
    }

    let head = entry.read_prefix(SNIFF_LEN).await?;
    match sniff(&head) {
        Some(mime_type) => Ok(Classification::Accept {
            mime_type: mime_type.to_string(),
        }),
        None => Err(ImportError::UnknownMimeType {
            entry: entry.name().to_string(),
        }),
    }
}

/// Hidden files, macOS resource forks, Windows thumbnail caches and anything
/// that is not a regular file.
pub fn is_ignored(name: &str, is_regular_file: bool) -> bool {
    if !is_regular_file {
        return true;
    }

    let path = Path::new(name);
    let base = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(name);
    let dir = path.parent().and_then(|p| p.to_str()).unwrap_or("");

    base.starts_with('.')
        || base == "__MACOSX"
        || dir.contains("__MACOSX")
        || base == "Thumbs.db"
}

/// Content type from the file extension.
pub fn mime_type_from_name(name: &str) -> Option<String> {
    let path = Path::new(name);
    if path.extension().and_then(|e| e.to_str()) == Some("geojson") {
        return Some(GEOJSON_MIME_TYPE.to_string());
    }

    mime_guess::from_path(path)
        .first()
        .map(|mime| mime.essence_str().to_string())
}

/// Content type from magic bytes.
pub fn sniff(data: &[u8]) -> Option<&'static str> {
    infer::get(data).map(|kind| kind.mime_type())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::open_archive;
    use crate::test_helpers::{write_zip, ZipFixture};

    #[test]
    fn test_ignored_names() {
        assert!(is_ignored(".DS_Store", true));
        assert!(is_ignored("css/.hidden", true));
        assert!(is_ignored("__MACOSX", true));
        assert!(is_ignored("__MACOSX/index.html", true));
        assert!(is_ignored("a/__MACOSX/b/._index.html", true));
        assert!(is_ignored("img/Thumbs.db", true));
        assert!(is_ignored("index.html", false));

        assert!(!is_ignored("index.html", true));
        assert!(!is_ignored("thumbs.db", true));
        assert!(!is_ignored("css/app.css", true));
    }

    #[test]
    fn test_mime_from_extension() {
        assert_eq!(
            mime_type_from_name("maps/areas.geojson").as_deref(),
            Some("application/geo+json")
        );
        assert_eq!(mime_type_from_name("index.html").as_deref(), Some("text/html"));
        assert_eq!(mime_type_from_name("css/app.css").as_deref(), Some("text/css"));
        assert_eq!(mime_type_from_name("no_extension"), None);
    }

    #[test]
    fn test_sniff_signatures() {
        assert_eq!(sniff(b"\x89PNG\r\n\x1a\n\0\0"), Some("image/png"));
        assert_eq!(sniff(b"%PDF-1.7"), Some("application/pdf"));
        assert_eq!(sniff(b"RIFF\0\0\0\0WEBPVP8 "), Some("image/webp"));
        assert_eq!(sniff(b"\0asm\x01\0\0\0"), Some("application/wasm"));
        assert_eq!(sniff(b"fLaC\0\0\0\x22"), Some("audio/x-flac"));
        assert_eq!(sniff(b"plain text"), None);
        assert_eq!(sniff(b""), None);
    }

    fn ftyp(brand: &[u8; 4]) -> Vec<u8> {
        let mut header = vec![0, 0, 0, 0x18];
        header.extend_from_slice(b"ftyp");
        header.extend_from_slice(brand);
        header.extend_from_slice(&[0, 0, 0, 0]);
        header.extend_from_slice(brand);
        header.extend_from_slice(brand);
        header
    }

    #[test]
    fn test_sniff_distinguishes_iso_media_brands() {
        assert_eq!(sniff(&ftyp(b"heic")), Some("image/heif"));
        assert_eq!(sniff(&ftyp(b"avif")), Some("image/avif"));
        assert_eq!(sniff(&ftyp(b"M4A ")), Some("audio/m4a"));
        assert_eq!(sniff(&ftyp(b"isom")), Some("video/mp4"));
    }

    #[tokio::test]
    async fn test_classify_entries() {
        let zip = write_zip(&[
            ZipFixture::file("index.html", b"<html></html>"),
            ZipFixture::file("image", b"\x89PNG\r\n\x1a\nrest"),
            ZipFixture::file("mystery", b"no magic here"),
            ZipFixture::file(".DS_Store", b"junk"),
            ZipFixture::dir("css/"),
        ]);
        let entries = open_archive(zip.path()).await.unwrap();

        assert_eq!(
            classify(&entries[0]).await.unwrap(),
            Classification::Accept {
                mime_type: "text/html".to_string()
            }
        );
        assert_eq!(
            classify(&entries[1]).await.unwrap(),
            Classification::Accept {
                mime_type: "image/png".to_string()
            }
        );
        match classify(&entries[2]).await {
            Err(ImportError::UnknownMimeType { entry }) => assert_eq!(entry, "mystery"),
            other => panic!("expected unknown mime type, got {:?}", other),
        }
        assert_eq!(classify(&entries[3]).await.unwrap(), Classification::Skip);
        assert_eq!(classify(&entries[4]).await.unwrap(), Classification::Skip);
    }

    #[tokio::test]
    async fn test_sniffed_entry_still_fully_readable() {
        let zip = write_zip(&[ZipFixture::file("image", b"\x89PNG\r\n\x1a\nrest-of-file")]);
        let entries = open_archive(zip.path()).await.unwrap();

        classify(&entries[0]).await.unwrap();
        let content = entries[0].read_bytes().await.unwrap();
        assert_eq!(&content[..], b"\x89PNG\r\n\x1a\nrest-of-file");
    }
}
