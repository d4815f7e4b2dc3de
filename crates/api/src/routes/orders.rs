//! Order intake endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use bus::EventBus;
use domain::{Order, OrderRequest, OrderStore};
use event_log::EventLog;

use crate::error::ApiError;
use crate::intake::OrderIntake;

/// Shared application state accessible from all handlers.
pub struct AppState<B, L, O> {
    pub intake: OrderIntake<B, L, O>,
    pub event_log: L,
}

/// POST /api/order — create an order and start its saga.
#[tracing::instrument(skip(state, request))]
pub async fn create<B, L, O>(
    State(state): State<Arc<AppState<B, L, O>>>,
    Json(request): Json<OrderRequest>,
) -> Result<(StatusCode, Json<Order>), ApiError>
where
    B: EventBus + 'static,
    L: EventLog + 'static,
    O: OrderStore + 'static,
{
    let order = state.intake.create_order(request).await?;
    Ok((StatusCode::CREATED, Json(order)))
}
