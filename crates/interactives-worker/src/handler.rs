//! Message handler trait
//!
//! The consumer calls `handle` once per received message. The result only
//! drives logging; the message is acknowledged either way.

use anyhow::Result;
use async_trait::async_trait;
use interactives_importer::InteractivesUploadedHandler;

#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, body: &[u8]) -> Result<()>;
}

/// Feeds message bodies to the archive importer.
#[derive(Clone)]
pub struct ImportMessageHandler {
    importer: InteractivesUploadedHandler,
}

impl ImportMessageHandler {
    pub fn new(importer: InteractivesUploadedHandler) -> Self {
        Self { importer }
    }
}

#[async_trait]
impl MessageHandler for ImportMessageHandler {
    async fn handle(&self, body: &[u8]) -> Result<()> {
        self.importer.handle(body).await?;
        Ok(())
    }
}
