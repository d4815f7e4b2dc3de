//! Static definition of the saga's participant steps.

use crate::status::EventSource;
use crate::topic::Topic;

/// One participant step: who runs it and where its forward and
/// compensation dispatches go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SagaStep {
    pub source: EventSource,
    pub forward_topic: Topic,
    pub compensation_topic: Topic,
}

/// The ordered list of participant steps.
///
/// The order is total and static: forward execution walks it front to
/// back, compensation walks it back to front. Lookups are by participant
/// identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SagaTopology {
    steps: Vec<SagaStep>,
}

impl SagaTopology {
    /// Creates a topology from an ordered list of steps.
    pub fn new(steps: Vec<SagaStep>) -> Self {
        Self { steps }
    }

    /// The standard order-fulfillment pipeline:
    /// product validation → payment → inventory.
    pub fn order_fulfillment() -> Self {
        Self::new(vec![
            SagaStep {
                source: EventSource::ProductValidation,
                forward_topic: Topic::ProductValidationSuccess,
                compensation_topic: Topic::ProductValidationFail,
            },
            SagaStep {
                source: EventSource::Payment,
                forward_topic: Topic::PaymentSuccess,
                compensation_topic: Topic::PaymentFail,
            },
            SagaStep {
                source: EventSource::Inventory,
                forward_topic: Topic::InventorySuccess,
                compensation_topic: Topic::InventoryFail,
            },
        ])
    }

    /// Returns all steps in forward order.
    pub fn steps(&self) -> &[SagaStep] {
        &self.steps
    }

    /// Returns the first forward step.
    pub fn first_step(&self) -> Option<&SagaStep> {
        self.steps.first()
    }

    /// Returns the step owned by the given participant.
    pub fn step_for(&self, source: EventSource) -> Option<&SagaStep> {
        self.steps.iter().find(|step| step.source == source)
    }

    /// Returns the step immediately after the given participant in
    /// forward order.
    pub fn step_after(&self, source: EventSource) -> Option<&SagaStep> {
        let position = self.position(source)?;
        self.steps.get(position + 1)
    }

    /// Returns the step immediately before the given participant in
    /// forward order.
    pub fn step_before(&self, source: EventSource) -> Option<&SagaStep> {
        let position = self.position(source)?;
        position.checked_sub(1).and_then(|p| self.steps.get(p))
    }

    fn position(&self, source: EventSource) -> Option<usize> {
        self.steps.iter().position(|step| step.source == source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_fulfillment_step_order() {
        let topology = SagaTopology::order_fulfillment();
        let sources: Vec<EventSource> = topology.steps().iter().map(|s| s.source).collect();
        assert_eq!(
            sources,
            [
                EventSource::ProductValidation,
                EventSource::Payment,
                EventSource::Inventory,
            ]
        );
    }

    #[test]
    fn first_step_is_product_validation() {
        let topology = SagaTopology::order_fulfillment();
        assert_eq!(
            topology.first_step().unwrap().forward_topic,
            Topic::ProductValidationSuccess
        );
    }

    #[test]
    fn step_after_walks_forward() {
        let topology = SagaTopology::order_fulfillment();
        assert_eq!(
            topology
                .step_after(EventSource::ProductValidation)
                .unwrap()
                .source,
            EventSource::Payment
        );
        assert_eq!(
            topology.step_after(EventSource::Payment).unwrap().source,
            EventSource::Inventory
        );
        assert!(topology.step_after(EventSource::Inventory).is_none());
    }

    #[test]
    fn step_before_walks_backward() {
        let topology = SagaTopology::order_fulfillment();
        assert_eq!(
            topology.step_before(EventSource::Inventory).unwrap().source,
            EventSource::Payment
        );
        assert_eq!(
            topology.step_before(EventSource::Payment).unwrap().source,
            EventSource::ProductValidation
        );
        assert!(topology.step_before(EventSource::ProductValidation).is_none());
    }

    #[test]
    fn orchestrator_is_not_a_step() {
        let topology = SagaTopology::order_fulfillment();
        assert!(topology.step_for(EventSource::Orchestrator).is_none());
        assert!(topology.step_after(EventSource::Orchestrator).is_none());
        assert!(topology.step_before(EventSource::Orchestrator).is_none());
    }

    #[test]
    fn step_for_finds_own_topics() {
        let topology = SagaTopology::order_fulfillment();
        let payment = topology.step_for(EventSource::Payment).unwrap();
        assert_eq!(payment.forward_topic, Topic::PaymentSuccess);
        assert_eq!(payment.compensation_topic, Topic::PaymentFail);
    }
}
