//! Order persistence seam.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::OrderId;

use crate::error::DomainError;
use crate::order::Order;

/// Trait for order persistence used by the intake edge.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists a newly created order.
    async fn insert(&self, order: Order) -> Result<(), DomainError>;

    /// Looks up an order by ID.
    async fn find(&self, id: OrderId) -> Result<Option<Order>, DomainError>;
}

/// In-memory order store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored orders.
    pub fn order_count(&self) -> usize {
        self.orders.read().unwrap().len()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, order: Order) -> Result<(), DomainError> {
        self.orders.write().unwrap().insert(order.id, order);
        Ok(())
    }

    async fn find(&self, id: OrderId) -> Result<Option<Order>, DomainError> {
        Ok(self.orders.read().unwrap().get(&id).cloned())
    }
}
