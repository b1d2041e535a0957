use interactives_core::constants::DUPLICATE_FILE_MARKER;
use thiserror::Error;

/// Errors returned by the downstream HTTP clients.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("invalid response: {status} from {service}: {uri}, body: {body}")]
    InvalidResponse {
        service: &'static str,
        status: u16,
        uri: String,
        body: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Whether the upload service rejected the request because the destination
    /// path already holds a file.
    pub fn is_duplicate_file(&self) -> bool {
        self.to_string().contains(DUPLICATE_FILE_MARKER)
    }

    /// Status code returned by the service, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::InvalidResponse { status, .. } => Some(*status),
            ClientError::Http(e) => e.status().map(|s| s.as_u16()),
            ClientError::Config(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_detection_uses_body() {
        let err = ClientError::InvalidResponse {
            service: "upload-service",
            status: 409,
            uri: "http://localhost/upload-new".to_string(),
            body: format!("the bucket {}", DUPLICATE_FILE_MARKER),
        };
        assert!(err.is_duplicate_file());
        assert_eq!(err.status(), Some(409));

        let err = ClientError::InvalidResponse {
            service: "upload-service",
            status: 500,
            uri: "http://localhost/upload-new".to_string(),
            body: "internal error".to_string(),
        };
        assert!(!err.is_duplicate_file());
    }

    #[test]
    fn test_config_error_has_no_status() {
        let err = ClientError::Config("bad url".to_string());
        assert_eq!(err.status(), None);
        assert!(!err.is_duplicate_file());
    }
}
