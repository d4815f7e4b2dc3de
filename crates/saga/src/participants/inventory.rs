//! Inventory participant.
//!
//! Decrements available stock per order line and keeps a ledger row per
//! line with the pre- and post-decrement quantities. Compensation
//! restores the recorded `old_quantity` exactly, a snapshot restore
//! rather than an inverse decrement, since other sagas may have moved
//! the stock in the meantime.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{OrderId, TransactionId};

use crate::error::SagaError;
use crate::event::SagaEvent;
use crate::handler::SagaParticipant;
use crate::idempotency::{self, IdempotencyStore};
use crate::status::EventSource;

/// Stock levels around a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockLevel {
    pub previous: u32,
    pub remaining: u32,
}

/// Trait for the shared stock resource.
#[async_trait]
pub trait StockStore: Send + Sync {
    /// Returns the available quantity for a product, if the product has
    /// a stock row at all.
    async fn available(&self, code: &str) -> Result<Option<u32>, SagaError>;

    /// Atomically checks and decrements the available quantity,
    /// returning the levels before and after.
    async fn reserve(&self, code: &str, quantity: u32) -> Result<StockLevel, SagaError>;

    /// Restores the absolute availability recorded in a snapshot.
    async fn set_available(&self, code: &str, available: u32) -> Result<(), SagaError>;
}

/// Ledger row per order line, keyed by (order, transaction).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderInventoryRecord {
    pub order_id: OrderId,
    pub transaction_id: TransactionId,
    pub product_code: String,
    pub order_quantity: u32,
    pub old_quantity: u32,
    pub new_quantity: u32,
    pub compensated: bool,
}

/// Trait for the participant's local reservation ledger.
#[async_trait]
pub trait InventoryLedger: IdempotencyStore {
    /// Inserts the rows for one saga, failing with `DuplicateTransaction`
    /// when rows already exist for the key. Check and insert are atomic
    /// per key.
    async fn insert(&self, records: Vec<OrderInventoryRecord>) -> Result<(), SagaError>;

    /// Returns the rows for the key, empty when none exist.
    async fn find(
        &self,
        order_id: OrderId,
        transaction_id: TransactionId,
    ) -> Result<Vec<OrderInventoryRecord>, SagaError>;

    /// Flags the rows for the key as compensated. Rows are never deleted.
    async fn mark_compensated(
        &self,
        order_id: OrderId,
        transaction_id: TransactionId,
    ) -> Result<(), SagaError>;
}

/// In-memory stock store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStockStore {
    stock: Arc<RwLock<HashMap<String, u32>>>,
}

impl InMemoryStockStore {
    /// Creates a store seeded with (code, available) pairs.
    pub fn with_stock<I, S>(stock: I) -> Self
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        Self {
            stock: Arc::new(RwLock::new(
                stock.into_iter().map(|(code, n)| (code.into(), n)).collect(),
            )),
        }
    }
}

#[async_trait]
impl StockStore for InMemoryStockStore {
    async fn available(&self, code: &str) -> Result<Option<u32>, SagaError> {
        Ok(self.stock.read().unwrap().get(code).copied())
    }

    async fn reserve(&self, code: &str, quantity: u32) -> Result<StockLevel, SagaError> {
        let mut stock = self.stock.write().unwrap();
        let available = stock
            .get_mut(code)
            .ok_or_else(|| SagaError::StockNotFound(code.to_string()))?;
        if quantity > *available {
            return Err(SagaError::OutOfStock {
                product_code: code.to_string(),
                requested: quantity,
                available: *available,
            });
        }
        let previous = *available;
        *available -= quantity;
        Ok(StockLevel {
            previous,
            remaining: *available,
        })
    }

    async fn set_available(&self, code: &str, available: u32) -> Result<(), SagaError> {
        self.stock
            .write()
            .unwrap()
            .insert(code.to_string(), available);
        Ok(())
    }
}

/// In-memory reservation ledger.
#[derive(Debug, Clone, Default)]
pub struct InMemoryInventoryLedger {
    records: Arc<RwLock<HashMap<(OrderId, TransactionId), Vec<OrderInventoryRecord>>>>,
}

impl InMemoryInventoryLedger {
    /// Creates a new empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of sagas with ledger rows.
    pub fn saga_count(&self) -> usize {
        self.records.read().unwrap().len()
    }
}

#[async_trait]
impl IdempotencyStore for InMemoryInventoryLedger {
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
impl InventoryLedger for InMemoryInventoryLedger {
    async fn insert(&self, records: Vec<OrderInventoryRecord>) -> Result<(), SagaError> {
        let Some(first) = records.first() else {
            return Ok(());
        };
        let key = (first.order_id, first.transaction_id);

        let mut map = self.records.write().unwrap();
        if map.contains_key(&key) {
            return Err(SagaError::DuplicateTransaction {
                order_id: key.0,
                transaction_id: key.1,
            });
        }
        map.insert(key, records);
        Ok(())
    }

    async fn find(
        &self,
        order_id: OrderId,
        transaction_id: TransactionId,
    ) -> Result<Vec<OrderInventoryRecord>, SagaError> {
        Ok(self
            .records
            .read()
            .unwrap()
            .get(&(order_id, transaction_id))
            .cloned()
            .unwrap_or_default())
    }

    async fn mark_compensated(
        &self,
        order_id: OrderId,
        transaction_id: TransactionId,
    ) -> Result<(), SagaError> {
        if let Some(records) = self
            .records
            .write()
            .unwrap()
            .get_mut(&(order_id, transaction_id))
        {
            for record in records {
                record.compensated = true;
            }
        }
        Ok(())
    }
}

/// The inventory participant.
pub struct Inventory<St, L> {
    stock: St,
    ledger: L,
}

impl<St: StockStore, L: InventoryLedger> Inventory<St, L> {
    /// Creates the participant over a stock store and a ledger.
    pub fn new(stock: St, ledger: L) -> Self {
        Self { stock, ledger }
    }
}

#[async_trait]
impl<St: StockStore, L: InventoryLedger> SagaParticipant for Inventory<St, L> {
    fn source(&self) -> EventSource {
        EventSource::Inventory
    }

    fn action(&self) -> &'static str {
        "update inventory"
    }

    fn label(&self) -> &'static str {
        "inventory"
    }

    fn success_message(&self) -> &'static str {
        "Inventory updated successfully!"
    }

    fn guard(&self) -> &dyn IdempotencyStore {
        &self.ledger
    }

    async fn validate(&self, event: &SagaEvent) -> Result<(), SagaError> {
        for line in &event.payload.products {
            let code = line.product.code.as_str();
            let available = self
                .stock
                .available(code)
                .await?
                .ok_or_else(|| SagaError::StockNotFound(code.to_string()))?;
            if line.quantity > available {
                return Err(SagaError::OutOfStock {
                    product_code: code.to_string(),
                    requested: line.quantity,
                    available,
                });
            }
        }
        Ok(())
    }

    async fn execute(&self, event: &mut SagaEvent) -> Result<(), SagaError> {
        // The stock decrement and the ledger insert are not one
        // transaction, so the fence must hold right before the decrement:
        // a redelivered message must not touch stock a second time.
        idempotency::check_not_duplicate(&self.ledger, event.order_id, event.transaction_id)
            .await?;

        let mut records = Vec::with_capacity(event.payload.products.len());
        for line in &event.payload.products {
            let code = line.product.code.as_str();
            let level = self.stock.reserve(code, line.quantity).await?;
            records.push(OrderInventoryRecord {
                order_id: event.order_id,
                transaction_id: event.transaction_id,
                product_code: code.to_string(),
                order_quantity: line.quantity,
                old_quantity: level.previous,
                new_quantity: level.remaining,
                compensated: false,
            });
        }
        self.ledger.insert(records).await
    }

    async fn compensate(&self, event: &mut SagaEvent) -> Result<(), SagaError> {
        let records = self
            .ledger
            .find(event.order_id, event.transaction_id)
            .await?;
        for record in &records {
            self.stock
                .set_available(&record.product_code, record.old_quantity)
                .await?;
            tracing::info!(
                order_id = %event.order_id,
                product_code = %record.product_code,
                from = record.new_quantity,
                to = record.old_quantity,
                "restored inventory"
            );
        }
        if !records.is_empty() {
            self.ledger
                .mark_compensated(event.order_id, event.transaction_id)
                .await?;
        }
        Ok(())
    }
}
