//! Generic participant handler.
//!
//! Every participant runs the same template: fence against duplicates,
//! validate domain preconditions, execute the side effect, then report.
//! On the compensation path: undo from the local snapshot, then report.
//! The resulting event is always published to the orchestrator's
//! feedback channel, on success and on failure alike, so the saga never
//! stalls on a participant.

use async_trait::async_trait;
use bus::{BusError, EventBus};
use futures_util::StreamExt;

use crate::error::SagaError;
use crate::event::SagaEvent;
use crate::idempotency::{self, IdempotencyStore};
use crate::status::{EventSource, SagaStatus};
use crate::topic::Topic;
use crate::topology::SagaStep;

/// The capability set a participant contributes to the template.
///
/// Implementations contain only domain logic. Status transitions, history
/// entries, and publication are owned by [`ParticipantHandler`]; no
/// participant touches the event's source or status directly.
#[async_trait]
pub trait SagaParticipant: Send + Sync {
    /// Identity stamped on events this participant produces.
    fn source(&self) -> EventSource;

    /// Verb phrase used in forward-failure history messages.
    fn action(&self) -> &'static str;

    /// Short name used in rollback history messages.
    fn label(&self) -> &'static str;

    /// Message recorded when the forward pass succeeds.
    fn success_message(&self) -> &'static str;

    /// The local store consulted by the duplicate-transaction fence.
    fn guard(&self) -> &dyn IdempotencyStore;

    /// Checks domain preconditions. Must not mutate any shared resource.
    async fn validate(&self, event: &SagaEvent) -> Result<(), SagaError>;

    /// Executes the side effect: persists the local record capturing the
    /// compensation snapshot and mutates the shared resource. May write
    /// computed values back into the payload.
    async fn execute(&self, event: &mut SagaEvent) -> Result<(), SagaError>;

    /// Undoes a committed forward pass from the local snapshot. Must
    /// restore recorded values, never recompute inverses.
    async fn compensate(&self, event: &mut SagaEvent) -> Result<(), SagaError>;
}

/// Drives one participant: consumes its forward and compensation topics,
/// applies the template, and reports every outcome to the orchestrator.
pub struct ParticipantHandler<P, B> {
    participant: P,
    bus: B,
    step: SagaStep,
}

impl<P: SagaParticipant, B: EventBus> ParticipantHandler<P, B> {
    /// Creates a handler for the participant's step in the topology.
    pub fn new(participant: P, bus: B, step: SagaStep) -> Self {
        Self {
            participant,
            bus,
            step,
        }
    }

    /// Runs the forward pass and reports the outcome.
    ///
    /// Any failure (duplicate fence, validation, execution) marks the
    /// event `ROLLBACK_PENDING`; the event is published either way.
    /// Returns the processed event.
    pub async fn handle_forward(&self, mut event: SagaEvent) -> SagaEvent {
        match self.try_forward(&mut event).await {
            Ok(()) => {
                event.mark(
                    self.participant.source(),
                    SagaStatus::Success,
                    self.participant.success_message(),
                );
                tracing::info!(
                    order_id = %event.order_id,
                    transaction_id = %event.transaction_id,
                    participant = %self.participant.source(),
                    "forward pass succeeded"
                );
            }
            Err(error) => {
                tracing::error!(
                    order_id = %event.order_id,
                    transaction_id = %event.transaction_id,
                    participant = %self.participant.source(),
                    %error,
                    "forward pass failed"
                );
                event.mark(
                    self.participant.source(),
                    SagaStatus::RollbackPending,
                    format!("Fail to {}: {}", self.participant.action(), error),
                );
            }
        }
        self.report(&event).await;
        event
    }

    async fn try_forward(&self, event: &mut SagaEvent) -> Result<(), SagaError> {
        idempotency::check_not_duplicate(
            self.participant.guard(),
            event.order_id,
            event.transaction_id,
        )
        .await?;
        self.participant.validate(event).await?;
        self.participant.execute(event).await
    }

    /// Runs the compensation pass and reports the outcome.
    ///
    /// A failed compensation is recorded in the history but never
    /// re-thrown; the event is published regardless so the unwind keeps
    /// moving. Returns the processed event.
    pub async fn handle_compensate(&self, mut event: SagaEvent) -> SagaEvent {
        let message = match self.participant.compensate(&mut event).await {
            Ok(()) => {
                tracing::info!(
                    order_id = %event.order_id,
                    transaction_id = %event.transaction_id,
                    participant = %self.participant.source(),
                    "rollback executed"
                );
                format!("Rollback executed for {}!", self.participant.label())
            }
            Err(error) => {
                tracing::error!(
                    order_id = %event.order_id,
                    transaction_id = %event.transaction_id,
                    participant = %self.participant.source(),
                    %error,
                    "rollback not executed"
                );
                format!(
                    "Rollback not executed for {}: {}",
                    self.participant.label(),
                    error
                )
            }
        };
        event.mark(self.participant.source(), SagaStatus::Fail, message);
        self.report(&event).await;
        event
    }

    /// Publishes the resulting event to the orchestrator's feedback
    /// channel. Publish failures are logged and the message dropped.
    async fn report(&self, event: &SagaEvent) {
        let key = event.order_id.to_string();
        match serde_json::to_string(event) {
            Ok(payload) => {
                if let Err(error) = self
                    .bus
                    .publish(Topic::Orchestrator.as_str(), &key, payload)
                    .await
                {
                    tracing::error!(%error, order_id = %event.order_id, "failed to publish saga feedback");
                }
            }
            Err(error) => {
                tracing::error!(%error, order_id = %event.order_id, "failed to serialize saga feedback");
            }
        }
    }

    /// Consumes the participant's forward and compensation topics until
    /// the bus shuts down.
    pub async fn run(&self) -> Result<(), BusError> {
        let forward = self.bus.subscribe(self.step.forward_topic.as_str()).await?;
        let compensation = self
            .bus
            .subscribe(self.step.compensation_topic.as_str())
            .await?;
        let mut stream = futures_util::stream::select(forward, compensation);

        let compensation_topic = self.step.compensation_topic.as_str();
        while let Some(message) = stream.next().await {
            match serde_json::from_str::<SagaEvent>(&message.payload) {
                Ok(event) => {
                    if message.topic == compensation_topic {
                        self.handle_compensate(event).await;
                    } else {
                        self.handle_forward(event).await;
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
