//! The orchestrator's routing function.

use crate::status::{EventSource, SagaStatus};
use crate::topic::Topic;
use crate::topology::SagaTopology;

/// Computes the next topic for an event, from its source and status alone.
///
/// Pure function: payload contents never influence routing.
///
/// - `Success` from the orchestrator starts the pipeline; from a
///   participant it advances to the next forward step, or terminates
///   when the participant was the last step.
/// - `RollbackPending` means the source failed its own forward pass and
///   committed nothing, so the unwind starts at the participant *before*
///   it, or goes straight to the terminal topic when the first step
///   failed.
/// - `Fail` means a compensation just reported; the unwind continues with
///   the next earlier participant, or terminates when none remains.
pub fn next_topic(source: EventSource, status: SagaStatus, topology: &SagaTopology) -> Topic {
    match status {
        SagaStatus::Success => {
            let next = if source == EventSource::Orchestrator {
                topology.first_step()
            } else {
                topology.step_after(source)
            };
            next.map(|step| step.forward_topic)
                .unwrap_or(Topic::NotifyEnding)
        }
        SagaStatus::RollbackPending | SagaStatus::Fail => topology
            .step_before(source)
            .map(|step| step.compensation_topic)
            .unwrap_or(Topic::NotifyEnding),
    }
}
