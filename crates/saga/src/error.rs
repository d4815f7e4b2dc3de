//! Saga error types.
//!
//! Business rule violations are explicit variants so handlers can map
//! them to `ROLLBACK_PENDING` without string matching; infrastructure
//! failures surface through `Store`, `Serialization`, and `Bus`.

use bus::BusError;
use common::{OrderId, TransactionId};
use domain::Money;
use thiserror::Error;

/// Errors that can occur inside a saga hop.
#[derive(Debug, Error)]
pub enum SagaError {
    /// A local record already exists for this (order, transaction) key.
    #[error("There's another transaction for this validation")]
    DuplicateTransaction {
        order_id: OrderId,
        transaction_id: TransactionId,
    },

    /// The payload carried no product lines.
    #[error("Products list is empty!")]
    EmptyProducts,

    /// A product line was missing its code.
    #[error("Product must be informed!")]
    ProductNotInformed,

    /// The product code is unknown to the catalog.
    #[error("Product {0} does not exist in the catalog")]
    ProductNotFound(String),

    /// No stock row exists for the product.
    #[error("Inventory not found for product {0}")]
    StockNotFound(String),

    /// The requested quantity exceeds the available quantity.
    #[error("Product is out of stock!")]
    OutOfStock {
        product_code: String,
        requested: u32,
        available: u32,
    },

    /// The computed order total is below the payable minimum.
    #[error("The minimum amount available is {minimum}")]
    BelowMinimumAmount { amount: Money, minimum: Money },

    /// No payment record exists for this (order, transaction) key.
    #[error("Payment not found by order and transaction ID")]
    PaymentNotFound {
        order_id: OrderId,
        transaction_id: TransactionId,
    },

    /// Participant-local store failure.
    #[error("Store error: {0}")]
    Store(String),

    /// Event (de)serialization failure.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Bus failure.
    #[error("Bus error: {0}")]
    Bus(#[from] BusError),
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, SagaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_error_messages() {
        let err = SagaError::OutOfStock {
            product_code: "BOOKS".to_string(),
            requested: 2,
            available: 1,
        };
        assert_eq!(err.to_string(), "Product is out of stock!");

        let err = SagaError::BelowMinimumAmount {
            amount: Money::from_cents(5),
            minimum: Money::from_cents(10),
        };
        assert_eq!(err.to_string(), "The minimum amount available is 0.10");

        let err = SagaError::DuplicateTransaction {
            order_id: OrderId::new(),
            transaction_id: TransactionId::new(),
        };
        assert_eq!(
            err.to_string(),
            "There's another transaction for this validation"
        );
    }
}
