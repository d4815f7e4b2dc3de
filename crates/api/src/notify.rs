//! Terminal event listener.

use bus::{BusError, EventBus};
use event_log::EventLog;
use futures_util::StreamExt;
use saga::{SagaEvent, Topic};

/// Consumes the notify-ending topic and saves every terminal event to the
/// event log, making finished sagas visible to the query surface.
pub async fn run_notify_listener<B: EventBus, L: EventLog>(bus: B, log: L) -> Result<(), BusError> {
    let mut stream = bus.subscribe(Topic::NotifyEnding.as_str()).await?;

    while let Some(message) = stream.next().await {
        match serde_json::from_str::<SagaEvent>(&message.payload) {
            Ok(event) => {
                metrics::counter!("sagas_notified_total").increment(1);
                tracing::info!(
                    order_id = %event.order_id,
                    transaction_id = %event.transaction_id,
                    status = %event.status,
                    "saga notified"
                );
                if let Err(error) = log.save(&event).await {
                    tracing::error!(%error, order_id = %event.order_id, "failed to log terminal event");
                }
            }
            Err(error) => {
                tracing::error!(%error, topic = %message.topic, "discarding undecodable event");
            }
        }
    }
    Ok(())
}
