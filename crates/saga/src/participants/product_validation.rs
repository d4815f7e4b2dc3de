//! Product validation participant.
//!
//! Checks that every product line references a known catalog product and
//! records a validation row for the saga. Compensation flips the row to
//! failed; the row itself is never deleted.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{OrderId, TransactionId};

use crate::error::SagaError;
use crate::event::SagaEvent;
use crate::handler::SagaParticipant;
use crate::idempotency::IdempotencyStore;
use crate::status::EventSource;

/// Validation outcome kept per saga, keyed by (order, transaction).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRecord {
    pub order_id: OrderId,
    pub transaction_id: TransactionId,
    pub success: bool,
}

/// Trait for the product catalog lookup.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Returns true if a product with the given code exists.
    async fn exists(&self, code: &str) -> Result<bool, SagaError>;
}

/// Trait for the participant's local validation records.
#[async_trait]
pub trait ValidationStore: IdempotencyStore {
    /// Inserts the record, failing with `DuplicateTransaction` when one
    /// already exists for the key. Check and insert are atomic per key.
    async fn insert(&self, record: ValidationRecord) -> Result<(), SagaError>;

    /// Looks up the record for the key.
    async fn find(
        &self,
        order_id: OrderId,
        transaction_id: TransactionId,
    ) -> Result<Option<ValidationRecord>, SagaError>;

    /// Sets the success flag, inserting a record when none exists.
    async fn set_success(
        &self,
        order_id: OrderId,
        transaction_id: TransactionId,
        success: bool,
    ) -> Result<(), SagaError>;
}

/// In-memory product catalog.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProductCatalog {
    codes: Arc<RwLock<HashSet<String>>>,
}

impl InMemoryProductCatalog {
    /// Creates a catalog seeded with the given product codes.
    pub fn with_products<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            codes: Arc::new(RwLock::new(
                codes.into_iter().map(Into::into).collect(),
            )),
        }
    }

    /// Adds a product code to the catalog.
    pub fn add(&self, code: impl Into<String>) {
        self.codes.write().unwrap().insert(code.into());
    }
}

#[async_trait]
impl ProductCatalog for InMemoryProductCatalog {
    async fn exists(&self, code: &str) -> Result<bool, SagaError> {
        Ok(self.codes.read().unwrap().contains(code))
    }
}

/// In-memory validation record store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryValidationStore {
    records: Arc<RwLock<HashMap<(OrderId, TransactionId), ValidationRecord>>>,
}

impl InMemoryValidationStore {
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
impl IdempotencyStore for InMemoryValidationStore {
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
impl ValidationStore for InMemoryValidationStore {
    async fn insert(&self, record: ValidationRecord) -> Result<(), SagaError> {
        // Single write lock covers the existence check and the insert,
        // the in-memory analog of a unique constraint.
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
    ) -> Result<Option<ValidationRecord>, SagaError> {
        Ok(self
            .records
            .read()
            .unwrap()
            .get(&(order_id, transaction_id))
            .cloned())
    }

    async fn set_success(
        &self,
        order_id: OrderId,
        transaction_id: TransactionId,
        success: bool,
    ) -> Result<(), SagaError> {
        self.records
            .write()
            .unwrap()
            .entry((order_id, transaction_id))
            .and_modify(|record| record.success = success)
            .or_insert(ValidationRecord {
                order_id,
                transaction_id,
                success,
            });
        Ok(())
    }
}

/// The product validation participant.
pub struct ProductValidation<C, S> {
    catalog: C,
    store: S,
}

impl<C: ProductCatalog, S: ValidationStore> ProductValidation<C, S> {
    /// Creates the participant over a catalog and a validation store.
    pub fn new(catalog: C, store: S) -> Self {
        Self { catalog, store }
    }
}

#[async_trait]
impl<C: ProductCatalog, S: ValidationStore> SagaParticipant for ProductValidation<C, S> {
    fn source(&self) -> EventSource {
        EventSource::ProductValidation
    }

    fn action(&self) -> &'static str {
        "validate products"
    }

    fn label(&self) -> &'static str {
        "product validation"
    }

    fn success_message(&self) -> &'static str {
        "Products are validated successfully!"
    }

    fn guard(&self) -> &dyn IdempotencyStore {
        &self.store
    }

    async fn validate(&self, event: &SagaEvent) -> Result<(), SagaError> {
        if event.payload.products.is_empty() {
            return Err(SagaError::EmptyProducts);
        }
        for line in &event.payload.products {
            if line.product.code.is_empty() {
                return Err(SagaError::ProductNotInformed);
            }
            if !self.catalog.exists(line.product.code.as_str()).await? {
                return Err(SagaError::ProductNotFound(
                    line.product.code.to_string(),
                ));
            }
        }
        Ok(())
    }

    async fn execute(&self, event: &mut SagaEvent) -> Result<(), SagaError> {
        self.store
            .insert(ValidationRecord {
                order_id: event.order_id,
                transaction_id: event.transaction_id,
                success: true,
            })
            .await
    }

    async fn compensate(&self, event: &mut SagaEvent) -> Result<(), SagaError> {
        self.store
            .set_success(event.order_id, event.transaction_id, false)
            .await
    }
}
