//! Upload service client.

use crate::{ApiClient, ClientError, UploadBackend, UploadMetadata};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use std::time::Duration;

const SERVICE: &str = "upload-service";

/// Posts whole files to the upload service as single-chunk resumable uploads.
#[derive(Clone, Debug)]
pub struct UploadServiceClient {
    api: ApiClient,
}

impl UploadServiceClient {
    pub fn new(
        base_url: &str,
        service_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        Ok(Self {
            api: ApiClient::new(SERVICE, base_url, service_token, timeout)?,
        })
    }

    fn build_form(content: Bytes, metadata: &UploadMetadata) -> Result<Form, ClientError> {
        let length = content.len() as u64;
        let file = Part::stream_with_length(content, length)
            .file_name(metadata.file_name.clone())
            .mime_str(&metadata.mime_type)?;

        Ok(Form::new()
            .text("path", metadata.path.clone())
            .text("resumableFilename", metadata.file_name.clone())
            .text("isPublishable", metadata.is_publishable.to_string())
            .text("collectionId", metadata.collection_id.clone())
            .text("title", metadata.title.clone())
            .text("resumableTotalSize", metadata.size_in_bytes.to_string())
            .text("resumableType", metadata.mime_type.clone())
            .text("licence", metadata.license.clone())
            .text("licenceUrl", metadata.license_url.clone())
            .text("resumableChunkNumber", "1")
            .text("resumableTotalChunks", "1")
            .part("file", file))
    }
}

#[async_trait]
impl UploadBackend for UploadServiceClient {
    async fn upload(&self, content: Bytes, metadata: &UploadMetadata) -> Result<(), ClientError> {
        let uri = self.api.build_url("/upload-new");
        let form = Self::build_form(content, metadata)?;
        let request = self.api.client().post(&uri).multipart(form);

        self.api.send(&uri, request).await?;

        tracing::debug!(
            uri = %uri,
            path = %metadata.path,
            file_name = %metadata.file_name,
            size_bytes = metadata.size_in_bytes,
            "File uploaded"
        );
        Ok(())
    }

    async fn health_check(&self) -> Result<(), ClientError> {
        self.api.health().await
    }
}
