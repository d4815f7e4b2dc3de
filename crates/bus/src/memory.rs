use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures_util::stream;
use tokio::sync::mpsc;

use crate::Result;
use crate::bus::{EventBus, Message, MessageStream};

/// In-memory event bus implementation.
///
/// Fans every published message out to all current subscribers of the
/// topic over unbounded channels. A single queue per subscriber preserves
/// publish order for every key, which satisfies the per-key ordering
/// contract trivially.
#[derive(Clone, Default)]
pub struct InMemoryEventBus {
    topics: Arc<Mutex<HashMap<String, Vec<mpsc::UnboundedSender<Message>>>>>,
}

impl InMemoryEventBus {
    /// Creates a new empty in-memory bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of live subscribers for a topic.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics
            .lock()
            .unwrap()
            .get(topic)
            .map(|senders| senders.iter().filter(|s| !s.is_closed()).count())
            .unwrap_or(0)
    }
}

#[async_trait]
impl EventBus for InMemoryEventBus {
    async fn publish(&self, topic: &str, key: &str, payload: String) -> Result<()> {
        let message = Message {
            topic: topic.to_string(),
            key: key.to_string(),
            payload,
        };

        let mut topics = self.topics.lock().unwrap();

        if let Some(senders) = topics.get_mut(topic) {
            // Drop subscribers whose receiving end has gone away.
            senders.retain(|sender| sender.send(message.clone()).is_ok());
        }

        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<MessageStream> {
        let (tx, rx) = mpsc::unbounded_channel();

        self.topics
            .lock()
            .unwrap()
            .entry(topic.to_string())
            .or_default()
            .push(tx);

        let stream = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|message| (message, rx))
        });

        Ok(Box::pin(stream))
    }
}
