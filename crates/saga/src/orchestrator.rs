//! The saga orchestrator.
//!
//! Consumes the start topic and the feedback channel, asks the router
//! for the next hop, and publishes the event there. Only (source, status)
//! drive routing; the orchestrator never inspects the payload.

use bus::{BusError, EventBus};
use chrono::Utc;
use futures_util::StreamExt;

use crate::event::SagaEvent;
use crate::router;
use crate::status::{EventSource, SagaStatus};
use crate::topic::Topic;
use crate::topology::SagaTopology;

/// Routes saga events between participants and stamps the terminal
/// history entries.
pub struct Orchestrator<B> {
    bus: B,
    topology: SagaTopology,
}

impl<B: EventBus> Orchestrator<B> {
    /// Creates an orchestrator over the given bus and topology.
    pub fn new(bus: B, topology: SagaTopology) -> Self {
        Self { bus, topology }
    }

    /// Picks up a brand-new saga from the start topic: stamps the
    /// orchestrator's identity and the "Saga started!" history entry,
    /// then dispatches the first forward step. Returns the routed event.
    pub async fn start_saga(&self, mut event: SagaEvent) -> SagaEvent {
        event.mark(
            EventSource::Orchestrator,
            SagaStatus::Success,
            "Saga started!",
        );
        metrics::counter!("sagas_started_total").increment(1);
        tracing::info!(
            order_id = %event.order_id,
            transaction_id = %event.transaction_id,
            "saga started"
        );
        self.dispatch(event).await
    }

    /// Routes a participant's feedback to the next hop, forward or
    /// backward. Returns the routed event.
    pub async fn continue_saga(&self, event: SagaEvent) -> SagaEvent {
        tracing::info!(
            order_id = %event.order_id,
            source = %event.source,
            status = %event.status,
            "saga continuing"
        );
        self.dispatch(event).await
    }

    async fn dispatch(&self, mut event: SagaEvent) -> SagaEvent {
        let topic = router::next_topic(event.source, event.status, &self.topology);
        if topic == Topic::NotifyEnding {
            self.finish(&mut event);
        }
        self.publish(topic, &event).await;
        event
    }

    /// Stamps the terminal history entry. Reached exactly once per saga:
    /// the router only yields the notify topic for a terminal
    /// (source, status) pair, and nothing republishes past it.
    fn finish(&self, event: &mut SagaEvent) {
        let elapsed = (Utc::now() - event.created_at).num_milliseconds() as f64 / 1000.0;
        metrics::histogram!("saga_duration_seconds").record(elapsed);

        if event.status == SagaStatus::Success {
            event.mark(
                EventSource::Orchestrator,
                SagaStatus::Success,
                "Saga finished successfully!",
            );
            metrics::counter!("sagas_completed_total").increment(1);
            tracing::info!(order_id = %event.order_id, "saga finished successfully");
        } else {
            event.mark(
                EventSource::Orchestrator,
                SagaStatus::Fail,
                "Saga finished with errors!",
            );
            metrics::counter!("sagas_failed_total").increment(1);
            tracing::warn!(order_id = %event.order_id, "saga finished with errors");
        }
    }

    /// Publishes the event, keyed by order ID for per-saga ordering.
    /// Publish failures are logged and the message dropped.
    async fn publish(&self, topic: Topic, event: &SagaEvent) {
        let key = event.order_id.to_string();
        match serde_json::to_string(event) {
            Ok(payload) => {
                tracing::debug!(topic = %topic, order_id = %event.order_id, "publishing event");
                if let Err(error) = self.bus.publish(topic.as_str(), &key, payload).await {
                    tracing::error!(%error, topic = %topic, order_id = %event.order_id, "failed to publish event");
                }
            }
            Err(error) => {
                tracing::error!(%error, order_id = %event.order_id, "failed to serialize event");
            }
        }
    }

    /// Consumes the start topic and the feedback channel until the bus
    /// shuts down.
    pub async fn run(&self) -> Result<(), BusError> {
        let start = self.bus.subscribe(Topic::StartSaga.as_str()).await?;
        let feedback = self.bus.subscribe(Topic::Orchestrator.as_str()).await?;
        let mut stream = futures_util::stream::select(start, feedback);

        while let Some(message) = stream.next().await {
            match serde_json::from_str::<SagaEvent>(&message.payload) {
                Ok(event) => {
                    if message.topic == Topic::StartSaga.as_str() {
                        self.start_saga(event).await;
                    } else {
                        self.continue_saga(event).await;
                    }
                }
                Err(error) => {
                    tracing::error!(%error, topic = %message.topic, "discarding undecodable event");
                }
            }
        }
        Ok(())
    }
}
