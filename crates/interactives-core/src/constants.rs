//! Fixed values shared with the upload service and the catalog API.

/// Top-level directory for every uploaded interactive file.
pub const UPLOAD_ROOT_DIRECTORY: &str = "interactives";

/// Substring the upload service places in its error body when the destination
/// path already holds a file.
pub const DUPLICATE_FILE_MARKER: &str = "already contains a file with this path";

/// Upper bound on upload attempts for one file when versions collide.
pub const MAX_UPLOAD_ATTEMPTS: u32 = 10;

/// Length of the per-import random path segment.
pub const RANDOM_SUFFIX_LENGTH: usize = 16;

pub const LICENSE_NAME: &str = "Open Government Licence v3.0";
pub const LICENSE_URL: &str =
    "https://www.nationalarchives.gov.uk/doc/open-government-licence/version/3/";

/// Content type for GeoJSON, absent from the usual extension tables.
pub const GEOJSON_MIME_TYPE: &str = "application/geo+json";

/// How often (in processed entries) batch progress is logged.
pub const PROGRESS_LOG_INTERVAL: u64 = 1000;
