//! The saga participants and their local stores.

pub mod inventory;
pub mod payment;
pub mod product_validation;

pub use inventory::{
    InMemoryInventoryLedger, InMemoryStockStore, Inventory, InventoryLedger, OrderInventoryRecord,
    StockLevel, StockStore,
};
pub use payment::{
    InMemoryPaymentStore, Payment, PaymentRecord, PaymentStatus, PaymentStore, MINIMUM_AMOUNT,
};
pub use product_validation::{
    InMemoryProductCatalog, InMemoryValidationStore, ProductCatalog, ProductValidation,
    ValidationRecord, ValidationStore,
};
