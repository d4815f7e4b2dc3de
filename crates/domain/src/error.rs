//! Domain error types.

use thiserror::Error;

/// Errors raised by order-shape validation and the order store.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The order request carried no product lines.
    #[error("Products list is empty!")]
    EmptyProducts,

    /// A product line was missing its product code.
    #[error("Product must be informed!")]
    ProductNotInformed,

    /// A product line requested a non-positive quantity.
    #[error("Quantity must be greater than zero for product {product_code}")]
    InvalidQuantity { product_code: String },

    /// Order store failure.
    #[error("Order store error: {0}")]
    Store(String),
}
