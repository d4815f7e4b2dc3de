//! Payment participant.
//!
//! Computes the order totals, writes them back into the payload so
//! downstream hops see them, and keeps a payment record per saga.
//! Compensation marks the record refunded; records are never deleted.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{OrderId, TransactionId};
use domain::Money;

use crate::error::SagaError;
use crate::event::SagaEvent;
use crate::handler::SagaParticipant;
use crate::idempotency::IdempotencyStore;
use crate::status::EventSource;

/// The minimum payable order total.
pub const MINIMUM_AMOUNT: Money = Money::from_cents(10);

/// Lifecycle of a payment record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    /// Record created, not yet committed.
    Pending,
    /// Payment committed.
    Success,
    /// Payment refunded during compensation.
    Refund,
}

/// Payment kept per saga, keyed by (order, transaction).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRecord {
    pub order_id: OrderId,
    pub transaction_id: TransactionId,
    pub total_amount: Money,
    pub total_items: u32,
    pub status: PaymentStatus,
}

/// Trait for the participant's local payment records.
#[async_trait]
pub trait PaymentStore: IdempotencyStore {
    /// Inserts the record, failing with `DuplicateTransaction` when one
    /// already exists for the key. Check and insert are atomic per key.
    async fn insert(&self, record: PaymentRecord) -> Result<(), SagaError>;

    /// Looks up the record for the key.
    async fn find(
        &self,
        order_id: OrderId,
        transaction_id: TransactionId,
    ) -> Result<Option<PaymentRecord>, SagaError>;

    /// Updates the record's status, failing when no record exists.
    async fn update_status(
        &self,
        order_id: OrderId,
        transaction_id: TransactionId,
        status: PaymentStatus,
    ) -> Result<(), SagaError>;
}

/// In-memory payment record store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentStore {
    records: Arc<RwLock<HashMap<(OrderId, TransactionId), PaymentRecord>>>,
}

impl InMemoryPaymentStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored records.
    pub fn record_count(&self) -> usize {
        self.records.read().unwrap().len()
    }
}

#[async_trait]
impl IdempotencyStore for InMemoryPaymentStore {
    async fn exists(
        &self,
        order_id: OrderId,
        transaction_id: TransactionId,
    ) -> Result<bool, SagaError> {
        Ok(self
            .records
            .read()
            .unwrap()
            .contains_key(&(order_id, transaction_id)))
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn insert(&self, record: PaymentRecord) -> Result<(), SagaError> {
        let mut records = self.records.write().unwrap();
        let key = (record.order_id, record.transaction_id);
        if records.contains_key(&key) {
            return Err(SagaError::DuplicateTransaction {
                order_id: record.order_id,
                transaction_id: record.transaction_id,
            });
        }
        records.insert(key, record);
        Ok(())
    }

    async fn find(
        &self,
        order_id: OrderId,
        transaction_id: TransactionId,
    ) -> Result<Option<PaymentRecord>, SagaError> {
        Ok(self
            .records
            .read()
            .unwrap()
            .get(&(order_id, transaction_id))
            .cloned())
    }

    async fn update_status(
        &self,
        order_id: OrderId,
        transaction_id: TransactionId,
        status: PaymentStatus,
    ) -> Result<(), SagaError> {
        let mut records = self.records.write().unwrap();
        let record = records
            .get_mut(&(order_id, transaction_id))
            .ok_or(SagaError::PaymentNotFound {
                order_id,
                transaction_id,
            })?;
        record.status = status;
        Ok(())
    }
}

/// The payment participant.
pub struct Payment<S> {
    store: S,
    minimum_amount: Money,
}

impl<S: PaymentStore> Payment<S> {
    /// Creates the participant with the standard minimum amount.
    pub fn new(store: S) -> Self {
        Self::with_minimum(store, MINIMUM_AMOUNT)
    }

    /// Creates the participant with a custom minimum amount.
    pub fn with_minimum(store: S, minimum_amount: Money) -> Self {
        Self {
            store,
            minimum_amount,
        }
    }
}

#[async_trait]
impl<S: PaymentStore> SagaParticipant for Payment<S> {
    fn source(&self) -> EventSource {
        EventSource::Payment
    }

    fn action(&self) -> &'static str {
        "realize payment"
    }

    fn label(&self) -> &'static str {
        "payment"
    }

    fn success_message(&self) -> &'static str {
        "Payment realized successfully!"
    }

    fn guard(&self) -> &dyn IdempotencyStore {
        &self.store
    }

    async fn validate(&self, event: &SagaEvent) -> Result<(), SagaError> {
        let amount = event.payload.calculate_amount();
        if amount < self.minimum_amount {
            return Err(SagaError::BelowMinimumAmount {
                amount,
                minimum: self.minimum_amount,
            });
        }
        Ok(())
    }

    async fn execute(&self, event: &mut SagaEvent) -> Result<(), SagaError> {
        let total_amount = event.payload.calculate_amount();
        let total_items = event.payload.calculate_items();

        self.store
            .insert(PaymentRecord {
                order_id: event.order_id,
                transaction_id: event.transaction_id,
                total_amount,
                total_items,
                status: PaymentStatus::Pending,
            })
            .await?;

        // Downstream participants see the computed totals.
        event.payload.total_amount = total_amount;
        event.payload.total_items = total_items;

        // Commit point.
        self.store
            .update_status(event.order_id, event.transaction_id, PaymentStatus::Success)
            .await
    }

    async fn compensate(&self, event: &mut SagaEvent) -> Result<(), SagaError> {
        let record = self
            .store
            .find(event.order_id, event.transaction_id)
            .await?
            .ok_or(SagaError::PaymentNotFound {
                order_id: event.order_id,
                transaction_id: event.transaction_id,
            })?;

        self.store
            .update_status(event.order_id, event.transaction_id, PaymentStatus::Refund)
            .await?;

        event.payload.total_amount = record.total_amount;
        event.payload.total_items = record.total_items;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{Order, OrderProduct, OrderRequest, Product};

    fn event_for(unit_cents: i64, quantity: u32) -> SagaEvent {
        let order = Order::from_request(OrderRequest {
            products: vec![OrderProduct::new(
                Product::new("BOOKS", Money::from_cents(unit_cents)),
                quantity,
            )],
        });
        SagaEvent::new(order.id, order.transaction_id, order)
    }

    fn participant() -> Payment<InMemoryPaymentStore> {
        Payment::new(InMemoryPaymentStore::new())
    }

    #[tokio::test]
    async fn validate_accepts_amount_at_minimum() {
        let participant = participant();
        let event = event_for(10, 1);
        assert!(participant.validate(&event).await.is_ok());
    }

    #[tokio::test]
    async fn validate_rejects_amount_below_minimum() {
        let participant = participant();
        let event = event_for(5, 1);

        match participant.validate(&event).await {
            Err(SagaError::BelowMinimumAmount { amount, minimum }) => {
                assert_eq!(amount, Money::from_cents(5));
                assert_eq!(minimum, MINIMUM_AMOUNT);
            }
            other => panic!("expected BelowMinimumAmount, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn execute_computes_totals_and_commits() {
        let participant = participant();
        let mut event = event_for(500, 2);

        participant.execute(&mut event).await.unwrap();

        assert_eq!(event.payload.total_amount, Money::from_cents(1000));
        assert_eq!(event.payload.total_items, 2);

        let record = participant
            .store
            .find(event.order_id, event.transaction_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.status, PaymentStatus::Success);
        assert_eq!(record.total_amount, Money::from_cents(1000));
        assert_eq!(record.total_items, 2);
    }

    #[tokio::test]
    async fn execute_rejects_duplicate_key() {
        let participant = participant();
        let mut event = event_for(500, 2);

        participant.execute(&mut event).await.unwrap();
        let again = participant.execute(&mut event).await;
        assert!(matches!(
            again,
            Err(SagaError::DuplicateTransaction { .. })
        ));
        assert_eq!(participant.store.record_count(), 1);
    }

    #[tokio::test]
    async fn compensate_marks_refund_and_keeps_record() {
        let participant = participant();
        let mut event = event_for(500, 2);

        participant.execute(&mut event).await.unwrap();
        participant.compensate(&mut event).await.unwrap();

        let record = participant
            .store
            .find(event.order_id, event.transaction_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.status, PaymentStatus::Refund);
        assert_eq!(participant.store.record_count(), 1);
        assert_eq!(event.payload.total_amount, Money::from_cents(1000));
    }

    #[tokio::test]
    async fn compensate_without_record_fails() {
        let participant = participant();
        let mut event = event_for(500, 2);

        let result = participant.compensate(&mut event).await;
        assert!(matches!(result, Err(SagaError::PaymentNotFound { .. })));
    }

    #[tokio::test]
    async fn totals_sum_over_all_lines() {
        let order = Order::from_request(OrderRequest {
            products: vec![
                OrderProduct::new(Product::new("BOOKS", Money::from_cents(500)), 2),
                OrderProduct::new(Product::new("MUSIC", Money::from_cents(250)), 3),
            ],
        });
        let mut event = SagaEvent::new(order.id, order.transaction_id, order);

        let participant = participant();
        participant.execute(&mut event).await.unwrap();

        assert_eq!(event.payload.total_amount, Money::from_cents(1750));
        assert_eq!(event.payload.total_items, 5);
    }
}
