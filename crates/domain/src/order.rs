//! Order payload types carried through the saga.

use chrono::{DateTime, Utc};
use common::{OrderId, TransactionId};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::money::Money;

/// Product identifier (catalog code).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Creates a new product ID from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the product ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the code is blank.
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ProductId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ProductId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for ProductId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A catalog product reference with its unit price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub code: ProductId,
    pub unit_value: Money,
}

impl Product {
    /// Creates a new product reference.
    pub fn new(code: impl Into<ProductId>, unit_value: Money) -> Self {
        Self {
            code: code.into(),
            unit_value,
        }
    }
}

/// One order line: a product and the quantity requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderProduct {
    pub product: Product,
    pub quantity: u32,
}

impl OrderProduct {
    /// Creates a new order line.
    pub fn new(product: Product, quantity: u32) -> Self {
        Self { product, quantity }
    }

    /// Returns the line total (quantity × unit value).
    pub fn line_total(&self) -> Money {
        self.product.unit_value.times(self.quantity)
    }
}

/// The order snapshot carried as the saga payload.
///
/// Participants mutate it additively: payment writes the computed totals
/// back into `total_amount`/`total_items` so downstream hops see them.
/// Prior fields are never overwritten destructively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub transaction_id: TransactionId,
    pub products: Vec<OrderProduct>,
    pub total_amount: Money,
    pub total_items: u32,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Builds a new order from a validated request, assigning fresh
    /// order and transaction IDs.
    pub fn from_request(request: OrderRequest) -> Self {
        Self {
            id: OrderId::new(),
            transaction_id: TransactionId::new(),
            products: request.products,
            total_amount: Money::zero(),
            total_items: 0,
            created_at: Utc::now(),
        }
    }

    /// Sums quantity × unit value over all order lines.
    pub fn calculate_amount(&self) -> Money {
        self.products.iter().map(OrderProduct::line_total).sum()
    }

    /// Sums the quantity over all order lines.
    pub fn calculate_items(&self) -> u32 {
        self.products.iter().map(|p| p.quantity).sum()
    }
}

/// Incoming order creation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    pub products: Vec<OrderProduct>,
}

impl OrderRequest {
    /// Validates the request shape: at least one line, every line with a
    /// product code and a positive quantity.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.products.is_empty() {
            return Err(DomainError::EmptyProducts);
        }
        for line in &self.products {
            if line.product.code.is_empty() {
                return Err(DomainError::ProductNotInformed);
            }
            if line.quantity == 0 {
                return Err(DomainError::InvalidQuantity {
                    product_code: line.product.code.to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_line_request() -> OrderRequest {
        OrderRequest {
            products: vec![
                OrderProduct::new(Product::new("BOOKS", Money::from_cents(500)), 2),
                OrderProduct::new(Product::new("MUSIC", Money::from_cents(250)), 1),
            ],
        }
    }

    #[test]
    fn from_request_assigns_fresh_identity() {
        let order = Order::from_request(two_line_request());
        let other = Order::from_request(two_line_request());
        assert_ne!(order.id, other.id);
        assert_ne!(order.transaction_id, other.transaction_id);
        assert_eq!(order.total_amount, Money::zero());
        assert_eq!(order.total_items, 0);
    }

    #[test]
    fn calculate_amount_sums_line_totals() {
        let order = Order::from_request(two_line_request());
        assert_eq!(order.calculate_amount(), Money::from_cents(1250));
        assert_eq!(order.calculate_items(), 3);
    }

    #[test]
    fn validate_rejects_empty_products() {
        let request = OrderRequest { products: vec![] };
        assert!(matches!(
            request.validate(),
            Err(DomainError::EmptyProducts)
        ));
    }

    #[test]
    fn validate_rejects_blank_product_code() {
        let request = OrderRequest {
            products: vec![OrderProduct::new(
                Product::new("  ", Money::from_cents(100)),
                1,
            )],
        };
        assert!(matches!(
            request.validate(),
            Err(DomainError::ProductNotInformed)
        ));
    }

    #[test]
    fn validate_rejects_zero_quantity() {
        let request = OrderRequest {
            products: vec![OrderProduct::new(
                Product::new("BOOKS", Money::from_cents(100)),
                0,
            )],
        };
        assert!(matches!(
            request.validate(),
            Err(DomainError::InvalidQuantity { .. })
        ));
    }

    #[test]
    fn order_serialization_roundtrip() {
        let order = Order::from_request(two_line_request());
        let json = serde_json::to_string(&order).unwrap();
        let deserialized: Order = serde_json::from_str(&json).unwrap();
        assert_eq!(order, deserialized);
    }
}
