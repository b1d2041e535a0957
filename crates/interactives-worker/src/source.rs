//! Message sources.

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_sqs::Client as SqsClient;

/// SQS caps one receive call at 10 messages.
const MAX_RECEIVE_BATCH: usize = 10;
/// Long-poll wait, the SQS maximum.
const WAIT_TIME_SECS: i32 = 20;

/// One received message.
#[derive(Debug, Clone)]
pub struct QueueMessage {
    pub id: String,
    /// Token used to acknowledge the message.
    pub receipt: String,
    pub body: Vec<u8>,
}

/// Where queued messages come from.
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Wait for up to `max` messages. May return an empty batch.
    async fn receive(&self, max: usize) -> Result<Vec<QueueMessage>>;

    /// Remove a handled message from the queue.
    async fn ack(&self, message: &QueueMessage) -> Result<()>;

    async fn health_check(&self) -> Result<()>;
}

/// SQS queue read with long polling.
#[derive(Clone, Debug)]
pub struct SqsMessageSource {
    client: SqsClient,
    queue_url: String,
}

impl SqsMessageSource {
    pub fn new(client: SqsClient, queue_url: impl Into<String>) -> Self {
        Self {
            client,
            queue_url: queue_url.into(),
        }
    }

    /// Build a client from the default AWS credential chain.
    pub async fn from_env(
        region: &str,
        endpoint: Option<&str>,
        queue_url: impl Into<String>,
    ) -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(region.to_string()))
            .load()
            .await;

        let mut builder = aws_sdk_sqs::config::Builder::from(&config);
        if let Some(endpoint) = endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        Self::new(SqsClient::from_conf(builder.build()), queue_url)
    }
}

#[async_trait]
impl MessageSource for SqsMessageSource {
    async fn receive(&self, max: usize) -> Result<Vec<QueueMessage>> {
        let max = max.clamp(1, MAX_RECEIVE_BATCH) as i32;
        let output = self
            .client
            .receive_message()
            .queue_url(&self.queue_url)
            .max_number_of_messages(max)
            .wait_time_seconds(WAIT_TIME_SECS)
            .send()
            .await
            .context("Failed to receive messages from SQS")?;

        let messages = output
            .messages
            .unwrap_or_default()
            .into_iter()
            .filter_map(|message| {
                let receipt = message.receipt_handle?;
                Some(QueueMessage {
                    id: message.message_id.unwrap_or_default(),
                    receipt,
                    body: message.body.unwrap_or_default().into_bytes(),
                })
            })
            .collect();

        Ok(messages)
    }

    async fn ack(&self, message: &QueueMessage) -> Result<()> {
        self.client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(&message.receipt)
            .send()
            .await
            .with_context(|| format!("Failed to delete SQS message {}", message.id))?;
        Ok(())
    }

    async fn health_check(&self) -> Result<()> {
        self.client
            .get_queue_attributes()
            .queue_url(&self.queue_url)
            .send()
            .await
            .context("Failed to reach SQS queue")?;
        Ok(())
    }
}
