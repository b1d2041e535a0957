//! Queue consumption for the importer.
//!
//! A [`QueueConsumer`] pulls messages from a [`MessageSource`] (SQS in
//! production), hands each body to a [`MessageHandler`] on a bounded pool of
//! tasks and acknowledges every message once its handler returns.

pub mod consumer;
pub mod handler;
pub mod source;

pub use consumer::{ConsumerConfig, QueueConsumer};
pub use handler::{ImportMessageHandler, MessageHandler};
pub use source::{MessageSource, QueueMessage, SqsMessageSource};
