//! Event bus abstraction for the saga system.
//!
//! The saga core only assumes a publish/subscribe primitive with
//! at-least-once delivery and per-key ordering. This crate defines that
//! primitive ([`EventBus`]) and provides an in-memory implementation used
//! by the standalone binary and the test suites. Payloads are opaque
//! serialized documents; the bus never inspects them.

pub mod bus;
pub mod error;
pub mod memory;

pub use bus::{EventBus, Message, MessageStream};
pub use error::{BusError, Result};
pub use memory::InMemoryEventBus;
