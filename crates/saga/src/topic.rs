//! Bus topic names.

/// The topics the saga flows through.
///
/// `-success` topics carry forward dispatch, `-fail` topics carry
/// compensation dispatch; both sides share the same event schema and are
/// distinguished only by which topic a message arrives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Entry point: the order intake publishes new sagas here.
    StartSaga,

    /// Feedback channel: every participant reports back here.
    Orchestrator,

    ProductValidationSuccess,
    ProductValidationFail,
    PaymentSuccess,
    PaymentFail,
    InventorySuccess,
    InventoryFail,

    /// Terminal topic: published exactly once per saga.
    NotifyEnding,
}

impl Topic {
    /// Returns the topic name as used on the bus.
    pub const fn as_str(self) -> &'static str {
        match self {
            Topic::StartSaga => "start-saga",
            Topic::Orchestrator => "orchestrator",
            Topic::ProductValidationSuccess => "product-validation-success",
            Topic::ProductValidationFail => "product-validation-fail",
            Topic::PaymentSuccess => "payment-success",
            Topic::PaymentFail => "payment-fail",
            Topic::InventorySuccess => "inventory-success",
            Topic::InventoryFail => "inventory-fail",
            Topic::NotifyEnding => "notify-ending",
        }
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
