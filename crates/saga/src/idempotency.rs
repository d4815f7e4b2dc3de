//! Duplicate-transaction fencing.
//!
//! Every participant keeps a local record keyed by
//! `(order_id, transaction_id)`. The fence rejects a forward pass when a
//! record already exists, which makes redelivered messages safe: the
//! business action runs at most once per key even though the bus delivers
//! at least once.
//!
//! The fence alone is only the fast path. Store implementations must also
//! reject duplicate keys at insert time under a single writer (the
//! unique-constraint analog); a bare check-then-insert would race two
//! concurrent deliveries of the same key.

use async_trait::async_trait;
use common::{OrderId, TransactionId};

use crate::error::SagaError;

/// Existence check over a participant-local record store.
#[async_trait]
pub trait IdempotencyStore: Send + Sync {
    /// Returns true if a local record exists for the key.
    async fn exists(
        &self,
        order_id: OrderId,
        transaction_id: TransactionId,
    ) -> Result<bool, SagaError>;
}

/// Fails with [`SagaError::DuplicateTransaction`] when a record already
/// exists for the key. Must run before any side-effecting write.
pub async fn check_not_duplicate(
    store: &dyn IdempotencyStore,
    order_id: OrderId,
    transaction_id: TransactionId,
) -> Result<(), SagaError> {
    if store.exists(order_id, transaction_id).await? {
        return Err(SagaError::DuplicateTransaction {
            order_id,
            transaction_id,
        });
    }
    Ok(())
}
