//! Saga status and event source enums.

use serde::{Deserialize, Serialize};

/// Saga-level outcome of the current hop.
///
/// Ownership contract: `RollbackPending` is set only by the participant
/// that just failed its own forward pass; `Fail` is set only when a
/// compensation step reports, or by the orchestrator's terminal failure
/// stamp. The handler template is the single writer for both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SagaStatus {
    /// The hop's forward action succeeded.
    Success,

    /// A compensation step completed (or the saga terminated with errors).
    Fail,

    /// A forward pass failed and the pipeline must unwind.
    RollbackPending,
}

impl SagaStatus {
    /// Returns the status name as used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            SagaStatus::Success => "SUCCESS",
            SagaStatus::Fail => "FAIL",
            SagaStatus::RollbackPending => "ROLLBACK_PENDING",
        }
    }
}

impl std::fmt::Display for SagaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Identity of the component that produced the current event version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventSource {
    Orchestrator,
    ProductValidation,
    Payment,
    Inventory,
}

impl EventSource {
    /// Returns the source name as used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventSource::Orchestrator => "ORCHESTRATOR",
            EventSource::ProductValidation => "PRODUCT_VALIDATION",
            EventSource::Payment => "PAYMENT",
            EventSource::Inventory => "INVENTORY",
        }
    }
}

impl std::fmt::Display for EventSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
