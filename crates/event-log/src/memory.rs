use std::sync::Arc;

use async_trait::async_trait;
use common::{OrderId, TransactionId};
use saga::SagaEvent;
use tokio::sync::RwLock;

use crate::Result;
use crate::log::EventLog;

/// In-memory event log implementation.
///
/// Stores event versions in insertion order and provides the same
/// interface as the PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryEventLog {
    events: Arc<RwLock<Vec<SagaEvent>>>,
}

impl InMemoryEventLog {
    /// Creates a new empty in-memory event log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of logged event versions.
    pub async fn event_count(&self) -> usize {
        self.events.read().await.len()
    }
}

#[async_trait]
impl EventLog for InMemoryEventLog {
    async fn save(&self, event: &SagaEvent) -> Result<()> {
        self.events.write().await.push(event.clone());
        Ok(())
    }

    async fn find_latest_by_order_id(&self, order_id: OrderId) -> Result<Option<SagaEvent>> {
        let events = self.events.read().await;
        Ok(events
            .iter()
            .rev()
            .find(|event| event.order_id == order_id)
            .cloned())
    }

    async fn find_latest_by_transaction_id(
        &self,
        transaction_id: TransactionId,
    ) -> Result<Option<SagaEvent>> {
        let events = self.events.read().await;
        Ok(events
            .iter()
            .rev()
            .find(|event| event.transaction_id == transaction_id)
            .cloned())
    }

    async fn find_all(&self) -> Result<Vec<SagaEvent>> {
        let events = self.events.read().await;
        Ok(events.iter().rev().cloned().collect())
    }
}
