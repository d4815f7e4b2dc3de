//! Event query endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use bus::EventBus;
use common::{OrderId, TransactionId};
use domain::OrderStore;
use event_log::EventLog;
use saga::SagaEvent;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::routes::orders::AppState;

/// Query parameters for the event lookup: either key selects the saga.
#[derive(Debug, Deserialize)]
pub struct EventFilter {
    pub order_id: Option<Uuid>,
    pub transaction_id: Option<Uuid>,
}

/// GET /api/event — latest event version for an order or transaction.
#[tracing::instrument(skip(state))]
pub async fn find_by_filters<B, L, O>(
    State(state): State<Arc<AppState<B, L, O>>>,
    Query(filter): Query<EventFilter>,
) -> Result<Json<SagaEvent>, ApiError>
where
    B: EventBus + 'static,
    L: EventLog + 'static,
    O: OrderStore + 'static,
{
    if let Some(order_id) = filter.order_id {
        let event = state
            .event_log
            .find_latest_by_order_id(OrderId::from_uuid(order_id))
            .await?
            .ok_or_else(|| ApiError::NotFound("Event not found by orderID.".to_string()))?;
        Ok(Json(event))
    } else if let Some(transaction_id) = filter.transaction_id {
        let event = state
            .event_log
            .find_latest_by_transaction_id(TransactionId::from_uuid(transaction_id))
            .await?
            .ok_or_else(|| ApiError::NotFound("Event not found by transactionID.".to_string()))?;
        Ok(Json(event))
    } else {
        Err(ApiError::BadRequest(
            "OrderID or TransactionID must be informed.".to_string(),
        ))
    }
}

/// GET /api/event/all — all logged event versions, newest first.
#[tracing::instrument(skip(state))]
pub async fn find_all<B, L, O>(
    State(state): State<Arc<AppState<B, L, O>>>,
) -> Result<Json<Vec<SagaEvent>>, ApiError>
where
    B: EventBus + 'static,
    L: EventLog + 'static,
    O: OrderStore + 'static,
{
    let events = state.event_log.find_all().await?;
    Ok(Json(events))
}
