use async_trait::async_trait;
use common::{OrderId, TransactionId};
use saga::SagaEvent;

use crate::Result;

/// Core trait for event log implementations.
///
/// The log is append-only: every saved event becomes a new row, and
/// "latest" queries resolve by insertion order (two versions of the same
/// saga share `created_at`, so creation time alone cannot break the tie).
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait EventLog: Send + Sync {
    /// Appends an event version to the log.
    async fn save(&self, event: &SagaEvent) -> Result<()>;

    /// Returns the most recently logged event for an order.
    async fn find_latest_by_order_id(&self, order_id: OrderId) -> Result<Option<SagaEvent>>;

    /// Returns the most recently logged event for a transaction.
    async fn find_latest_by_transaction_id(
        &self,
        transaction_id: TransactionId,
    ) -> Result<Option<SagaEvent>>;

    /// Returns all logged events, newest first.
    async fn find_all(&self) -> Result<Vec<SagaEvent>>;
}
