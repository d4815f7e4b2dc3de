//! Queryable log of saga events.
//!
//! The order intake saves the initial event version here and the
//! notify-ending listener saves the terminal one, so callers can observe
//! a saga's outcome asynchronously through the latest logged version and
//! its full history.

pub mod error;
pub mod log;
pub mod memory;
pub mod postgres;

pub use error::{EventLogError, Result};
pub use log::EventLog;
pub use memory::InMemoryEventLog;
pub use postgres::PostgresEventLog;
