//! Order domain for the saga system.
//!
//! This crate provides the order payload carried inside the saga event
//! envelope, the money value object, request-shape validation for order
//! intake, and the order persistence seam.

pub mod error;
pub mod money;
pub mod order;
pub mod store;

pub use error::DomainError;
pub use money::Money;
pub use order::{Order, OrderProduct, OrderRequest, Product, ProductId};
pub use store::{InMemoryOrderStore, OrderStore};
