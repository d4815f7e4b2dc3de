//! Order intake: the synchronous edge that starts a saga.

use bus::EventBus;
use domain::{Order, OrderRequest, OrderStore};
use event_log::EventLog;
use saga::{SagaEvent, Topic};

use crate::error::ApiError;

/// Creates orders and publishes the initial saga event.
///
/// Synchronous callers get back the created order, not saga completion;
/// the saga's outcome is observable only through the event query surface.
pub struct OrderIntake<B, L, O> {
    bus: B,
    event_log: L,
    orders: O,
}

impl<B: EventBus, L: EventLog, O: OrderStore> OrderIntake<B, L, O> {
    /// Creates the intake service.
    pub fn new(bus: B, event_log: L, orders: O) -> Self {
        Self {
            bus,
            event_log,
            orders,
        }
    }

    /// Validates the request, persists the order, logs the initial event,
    /// and publishes it to the start topic.
    #[tracing::instrument(skip(self, request))]
    pub async fn create_order(&self, request: OrderRequest) -> Result<Order, ApiError> {
        request.validate()?;

        let order = Order::from_request(request);
        self.orders.insert(order.clone()).await?;

        let event = SagaEvent::new(order.id, order.transaction_id, order.clone());
        self.event_log.save(&event).await?;

        tracing::info!(
            order_id = %order.id,
            transaction_id = %order.transaction_id,
            "order created"
        );

        // The order is already committed; a failed publish is logged and
        // the caller still gets the order back.
        match serde_json::to_string(&event) {
            Ok(payload) => {
                if let Err(error) = self
                    .bus
                    .publish(Topic::StartSaga.as_str(), &order.id.to_string(), payload)
                    .await
                {
                    tracing::error!(%error, order_id = %order.id, "failed to publish start event");
                }
            }
            Err(error) => {
                tracing::error!(%error, order_id = %order.id, "failed to serialize start event");
            }
        }

        Ok(order)
    }
}
