//! Queue consumer: bounded worker pool and per-message acknowledgement.
//!
//! Shutdown: [`QueueConsumer::shutdown`] stops receiving and then waits up to
//! the configured timeout for in-flight handlers before returning.

use crate::{MessageHandler, MessageSource, QueueMessage};
use interactives_core::Config;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;

#[derive(Clone, Debug)]
pub struct ConsumerConfig {
    /// Messages handled concurrently.
    pub max_workers: usize,
    /// Delay before receiving again after a receive error.
    pub error_backoff: Duration,
    /// How long shutdown waits for in-flight handlers.
    pub shutdown_timeout: Duration,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            max_workers: 1,
            error_backoff: Duration::from_secs(5),
            shutdown_timeout: Duration::from_secs(5),
        }
    }
}

impl ConsumerConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_workers: config.consumer_workers().max(1),
            shutdown_timeout: config.graceful_shutdown_timeout(),
            ..Default::default()
        }
    }
}

pub struct QueueConsumer {
    shutdown_tx: mpsc::Sender<()>,
    worker: JoinHandle<()>,
}

impl QueueConsumer {
    /// Spawn the receive loop.
    pub fn start(
        source: Arc<dyn MessageSource>,
        handler: Arc<dyn MessageHandler>,
        config: ConsumerConfig,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let worker = tokio::spawn(Self::worker_pool(source, handler, config, shutdown_rx));

        Self {
            shutdown_tx,
            worker,
        }
    }

    /// Stop receiving and wait for in-flight messages.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.worker.await {
            tracing::error!(error = %e, "Queue consumer task failed");
        }
    }

    async fn worker_pool(
        source: Arc<dyn MessageSource>,
        handler: Arc<dyn MessageHandler>,
        config: ConsumerConfig,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!(max_workers = config.max_workers, "Queue consumer started");

        let semaphore = Arc::new(Semaphore::new(config.max_workers));

        loop {
            // wait for a free worker before pulling more messages
            let available = tokio::select! {
                _ = shutdown_rx.recv() => break,
                permit = semaphore.clone().acquire_owned() => match permit {
                    Ok(permit) => {
                        let available = semaphore.available_permits() + 1;
                        drop(permit);
                        available
                    }
                    Err(_) => break,
                },
            };

            let messages = tokio::select! {
                _ = shutdown_rx.recv() => break,
                result = source.receive(available) => result,
            };

            let messages = match messages {
                Ok(messages) => messages,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to receive messages");
                    tokio::select! {
                        _ = shutdown_rx.recv() => break,
                        _ = tokio::time::sleep(config.error_backoff) => continue,
                    }
                }
            };

            for message in messages {
                let Ok(permit) = semaphore.clone().acquire_owned().await else {
                    break;
                };
                let source = source.clone();
                let handler = handler.clone();

                tokio::spawn(async move {
                    let _permit = permit;
                    Self::process_message(message, source.as_ref(), handler.as_ref()).await;
                });
            }
        }

        tracing::info!("Queue consumer shutting down, waiting for in-flight messages");
        let drained = tokio::time::timeout(
            config.shutdown_timeout,
            semaphore.acquire_many(config.max_workers as u32),
        )
        .await;
        if drained.is_err() {
            tracing::warn!(
                timeout_secs = config.shutdown_timeout.as_secs(),
                "In-flight messages still running at shutdown"
            );
        }

        tracing::info!("Queue consumer stopped");
    }

    #[tracing::instrument(skip_all, fields(message.id = %message.id))]
    async fn process_message(
        message: QueueMessage,
        source: &dyn MessageSource,
        handler: &dyn MessageHandler,
    ) {
        if let Err(e) = handler.handle(&message.body).await {
            tracing::error!(error = %e, "Message handling failed");
        }

        if let Err(e) = source.ack(&message).await {
            tracing::error!(error = %e, "Failed to acknowledge message");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemorySource {
        pending: Mutex<VecDeque<QueueMessage>>,
        acked: Mutex<Vec<String>>,
    }

    impl MemorySource {
        fn with_messages(bodies: &[&str]) -> Self {
            let pending = bodies
                .iter()
                .enumerate()
                .map(|(i, body)| QueueMessage {
                    id: format!("msg-{}", i),
                    receipt: format!("receipt-{}", i),
                    body: body.as_bytes().to_vec(),
                })
                .collect();
            Self {
                pending: Mutex::new(pending),
                acked: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl MessageSource for MemorySource {
        async fn receive(&self, max: usize) -> Result<Vec<QueueMessage>> {
            let batch: Vec<_> = {
                let mut pending = self.pending.lock().unwrap();
                let n = max.min(pending.len());
                pending.drain(..n).collect()
            };
            if batch.is_empty() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            Ok(batch)
        }

        async fn ack(&self, message: &QueueMessage) -> Result<()> {
            self.acked.lock().unwrap().push(message.id.clone());
            Ok(())
        }

        async fn health_check(&self) -> Result<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct CountingHandler {
        handled: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    #[async_trait]
    impl MessageHandler for CountingHandler {
        async fn handle(&self, body: &[u8]) -> Result<()> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.handled.fetch_add(1, Ordering::SeqCst);

            if body == b"bad" {
                return Err(anyhow!("cannot decode"));
            }
            Ok(())
        }
    }

    async fn wait_for(condition: impl Fn() -> bool) {
        for _ in 0..200 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached");
    }

    #[tokio::test]
    async fn test_every_message_is_acked_even_on_failure() {
        let source = Arc::new(MemorySource::with_messages(&["a", "bad", "c"]));
        let handler = Arc::new(CountingHandler::default());

        let consumer = QueueConsumer::start(
            source.clone(),
            handler.clone(),
            ConsumerConfig {
                max_workers: 2,
                ..Default::default()
            },
        );

        wait_for(|| source.acked.lock().unwrap().len() == 3).await;
        consumer.shutdown().await;

        assert_eq!(handler.handled.load(Ordering::SeqCst), 3);
        let mut acked = source.acked.lock().unwrap().clone();
        acked.sort();
        assert_eq!(acked, vec!["msg-0", "msg-1", "msg-2"]);
    }

    #[tokio::test]
    async fn test_worker_limit_is_respected() {
        let bodies: Vec<String> = (0..12).map(|i| format!("m{}", i)).collect();
        let refs: Vec<&str> = bodies.iter().map(String::as_str).collect();
        let source = Arc::new(MemorySource::with_messages(&refs));
        let handler = Arc::new(CountingHandler::default());

        let consumer = QueueConsumer::start(
            source.clone(),
            handler.clone(),
            ConsumerConfig {
                max_workers: 3,
                ..Default::default()
            },
        );

        wait_for(|| source.acked.lock().unwrap().len() == 12).await;
        consumer.shutdown().await;

        assert!(handler.max_in_flight.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_shutdown_with_empty_queue() {
        let source = Arc::new(MemorySource::default());
        let handler = Arc::new(CountingHandler::default());

        let consumer = QueueConsumer::start(source, handler.clone(), ConsumerConfig::default());
        tokio::time::sleep(Duration::from_millis(20)).await;
        consumer.shutdown().await;

        assert_eq!(handler.handled.load(Ordering::SeqCst), 0);
    }
}
