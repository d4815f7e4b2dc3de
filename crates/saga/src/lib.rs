//! Saga protocol core for order fulfillment.
//!
//! Coordinates a multi-step business transaction across independent
//! participants (product validation → payment → inventory) without a
//! distributed transaction manager: an orchestrator routes a shared event
//! envelope over the bus, and a failed forward step unwinds the committed
//! steps through compensation topics. Redelivery is safe because every
//! participant fences its side effect on (order, transaction).
//!
//! The pieces:
//! - [`event::SagaEvent`] and [`event::History`]: the envelope and its
//!   append-only audit trail, carried in full on every hop
//! - [`topology::SagaTopology`]: the static ordered step definitions
//! - [`router::next_topic`]: the pure routing function
//! - [`orchestrator::Orchestrator`]: start, continue, finish
//! - [`handler::ParticipantHandler`]: the generic
//!   validate/execute/compensate template every participant runs
//! - [`participants`]: the three participant implementations and their
//!   local stores

pub mod error;
pub mod event;
pub mod handler;
pub mod idempotency;
pub mod orchestrator;
pub mod participants;
pub mod router;
pub mod status;
pub mod topic;
pub mod topology;

pub use error::{Result, SagaError};
pub use event::{History, SagaEvent};
pub use handler::{ParticipantHandler, SagaParticipant};
pub use idempotency::{IdempotencyStore, check_not_duplicate};
pub use orchestrator::Orchestrator;
pub use participants::{
    InMemoryInventoryLedger, InMemoryPaymentStore, InMemoryProductCatalog, InMemoryStockStore,
    InMemoryValidationStore, Inventory, Payment, ProductValidation,
};
pub use router::next_topic;
pub use status::{EventSource, SagaStatus};
pub use topic::Topic;
pub use topology::{SagaStep, SagaTopology};
