//! The saga event envelope and its append-only history.

use chrono::{DateTime, Utc};
use common::{EventId, OrderId, TransactionId};
use domain::Order;
use serde::{Deserialize, Serialize};

use crate::status::{EventSource, SagaStatus};

/// One entry in the saga's audit trail.
///
/// Entries are immutable once appended and the trail is never reordered
/// or truncated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct History {
    pub source: EventSource,
    pub status: SagaStatus,
    pub message: String,
    /// Hop timestamp, not saga creation time.
    pub created_at: DateTime<Utc>,
}

/// The event envelope carried through every hop of the saga.
///
/// Every hop carries the full event, including the complete history, so
/// saga state is reconstructible from any single message. `(order_id,
/// transaction_id)` uniquely identifies one in-flight saga.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SagaEvent {
    pub id: EventId,
    pub order_id: OrderId,
    pub transaction_id: TransactionId,
    pub payload: Order,
    pub source: EventSource,
    pub status: SagaStatus,
    pub history: Vec<History>,
    /// Saga creation timestamp; never changed after construction.
    pub created_at: DateTime<Utc>,
}

impl SagaEvent {
    /// Creates the initial event for a new saga with an empty history.
    ///
    /// The orchestrator stamps the definitive source/status when it picks
    /// the saga up from the start topic.
    pub fn new(order_id: OrderId, transaction_id: TransactionId, payload: Order) -> Self {
        Self {
            id: EventId::new(),
            order_id,
            transaction_id,
            payload,
            source: EventSource::Orchestrator,
            status: SagaStatus::Success,
            history: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Sets the hop's source and status, then appends exactly one history
    /// entry recording them. This is the only mutation path handlers use,
    /// which keeps the one-entry-per-hop invariant by construction.
    pub fn mark(&mut self, source: EventSource, status: SagaStatus, message: impl Into<String>) {
        self.source = source;
        self.status = status;
        self.add_history(message);
    }

    /// Appends a history entry stamped with the current source and status.
    pub fn add_history(&mut self, message: impl Into<String>) {
        self.history.push(History {
            source: self.source,
            status: self.status,
            message: message.into(),
            created_at: Utc::now(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{Money, OrderProduct, OrderRequest, Product};

    fn sample_event() -> SagaEvent {
        let order = Order::from_request(OrderRequest {
            products: vec![OrderProduct::new(
                Product::new("BOOKS", Money::from_cents(500)),
                2,
            )],
        });
        SagaEvent::new(order.id, order.transaction_id, order)
    }

    #[test]
    fn new_event_has_empty_history() {
        let event = sample_event();
        assert!(event.history.is_empty());
        assert_eq!(event.order_id, event.payload.id);
        assert_eq!(event.transaction_id, event.payload.transaction_id);
    }

    #[test]
    fn mark_appends_exactly_one_entry() {
        let mut event = sample_event();

        event.mark(
            EventSource::ProductValidation,
            SagaStatus::Success,
            "Products are validated successfully!",
        );

        assert_eq!(event.history.len(), 1);
        assert_eq!(event.source, EventSource::ProductValidation);
        assert_eq!(event.status, SagaStatus::Success);

        let entry = &event.history[0];
        assert_eq!(entry.source, EventSource::ProductValidation);
        assert_eq!(entry.status, SagaStatus::Success);
        assert_eq!(entry.message, "Products are validated successfully!");
    }

    #[test]
    fn history_preserves_append_order() {
        let mut event = sample_event();

        event.mark(EventSource::Orchestrator, SagaStatus::Success, "first");
        event.mark(EventSource::ProductValidation, SagaStatus::Success, "second");
        event.mark(EventSource::Payment, SagaStatus::RollbackPending, "third");

        let messages: Vec<&str> = event.history.iter().map(|h| h.message.as_str()).collect();
        assert_eq!(messages, ["first", "second", "third"]);
    }

    #[test]
    fn created_at_survives_marks() {
        let mut event = sample_event();
        let created = event.created_at;

        event.mark(EventSource::Payment, SagaStatus::Success, "hop");
        assert_eq!(event.created_at, created);
    }

    #[test]
    fn serialization_roundtrip_keeps_wire_enum_names() {
        let mut event = sample_event();
        event.mark(
            EventSource::Inventory,
            SagaStatus::RollbackPending,
            "Fail to update inventory: Product is out of stock!",
        );

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"INVENTORY\""));
        assert!(json.contains("\"ROLLBACK_PENDING\""));

        let back: SagaEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
