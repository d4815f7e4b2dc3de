use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::Result;

/// A message delivered by the bus.
///
/// The key is the partition key: messages sharing a key are delivered in
/// publish order. The payload is an opaque serialized document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub topic: String,
    pub key: String,
    pub payload: String,
}

/// A stream of messages from a subscription.
pub type MessageStream = Pin<Box<dyn Stream<Item = Message> + Send>>;

/// Core trait for event bus implementations.
///
/// Implementations must provide at-least-once delivery and preserve
/// publish order for messages sharing a key. All implementations must be
/// thread-safe (Send + Sync).
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publishes a message to a topic.
    ///
    /// The key selects the partition; messages with the same key on the
    /// same topic are delivered in order.
    async fn publish(&self, topic: &str, key: &str, payload: String) -> Result<()>;

    /// Subscribes to a topic, returning a stream of all messages
    /// published after the subscription is registered.
    async fn subscribe(&self, topic: &str) -> Result<MessageStream>;
}
