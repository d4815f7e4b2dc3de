//! Integration tests for the API server.
//!
//! Each test wires the full in-process system: HTTP router, orchestrator,
//! participants, and notify listener over the in-memory bus. Saga
//! outcomes are observed the way real callers observe them, through the
//! event query surface.

use std::sync::OnceLock;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use metrics_exporter_prometheus::PrometheusHandle;
use saga::SagaEvent;
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            metrics_exporter_prometheus::PrometheusBuilder::new()
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

async fn setup() -> axum::Router {
    let (state, context) = api::create_default_state();
    context.spawn_workers();
    context.ready().await;
    api::create_app(state, get_metrics_handle())
}

async fn get_json(app: &axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

async fn post_order(app: &axum::Router, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/order")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

fn order_body(code: &str, unit_cents: i64, quantity: u32) -> serde_json::Value {
    serde_json::json!({
        "products": [{
            "product": { "code": code, "unit_value": unit_cents },
            "quantity": quantity
        }]
    })
}

/// Polls the event query until the saga's latest logged version is
/// terminal (history ends with a finish entry).
async fn await_terminal_event(app: &axum::Router, order_id: &str) -> SagaEvent {
    let uri = format!("/api/event?order_id={order_id}");
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let (status, json) = get_json(app, &uri).await;
            if status == StatusCode::OK {
                let event: SagaEvent = serde_json::from_value(json).unwrap();
                if event
                    .history
                    .last()
                    .is_some_and(|entry| entry.message.starts_with("Saga finished"))
                {
                    return event;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("saga did not reach a terminal state in time")
}

#[tokio::test]
async fn test_health_check() {
    let app = setup().await;
    let (status, json) = get_json(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup().await;
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_create_order_returns_created_order() {
    let app = setup().await;

    let (status, order) = post_order(&app, order_body("MUSIC", 500, 2)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(order["id"].is_string());
    assert!(order["transaction_id"].is_string());
    assert_eq!(order["products"][0]["product"]["code"], "MUSIC");
    // Totals are computed later, by the payment participant.
    assert_eq!(order["total_amount"], 0);
    assert_eq!(order["total_items"], 0);
}

#[tokio::test]
async fn test_create_order_with_empty_products_is_rejected() {
    let app = setup().await;

    let (status, json) = post_order(&app, serde_json::json!({ "products": [] })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Products list is empty!");
}

#[tokio::test]
async fn test_event_query_requires_a_key() {
    let app = setup().await;

    let (status, json) = get_json(&app, "/api/event").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "OrderID or TransactionID must be informed.");
}

#[tokio::test]
async fn test_event_query_unknown_order_is_not_found() {
    let app = setup().await;

    let (status, json) = get_json(
        &app,
        "/api/event?order_id=00000000-0000-0000-0000-000000000000",
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Event not found by orderID.");
}

#[tokio::test]
async fn test_successful_saga_is_observable_through_the_query() {
    let app = setup().await;

    let (status, order) = post_order(&app, order_body("MUSIC", 500, 2)).await;
    assert_eq!(status, StatusCode::CREATED);
    let order_id = order["id"].as_str().unwrap().to_string();

    let terminal = await_terminal_event(&app, &order_id).await;
    assert_eq!(terminal.status.as_str(), "SUCCESS");
    assert_eq!(terminal.history.len(), 5);
    assert_eq!(
        terminal.history.last().unwrap().message,
        "Saga finished successfully!"
    );
    assert_eq!(terminal.payload.total_amount.cents(), 1000);
    assert_eq!(terminal.payload.total_items, 2);

    // The same saga is reachable by transaction ID.
    let transaction_id = order["transaction_id"].as_str().unwrap();
    let (status, json) = get_json(
        &app,
        &format!("/api/event?transaction_id={transaction_id}"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let by_transaction: SagaEvent = serde_json::from_value(json).unwrap();
    assert_eq!(by_transaction.order_id, terminal.order_id);
}

#[tokio::test]
async fn test_out_of_stock_saga_terminates_with_errors() {
    let app = setup().await;

    // Demo stock has 2 BOOKS; ask for 3.
    let (status, order) = post_order(&app, order_body("BOOKS", 500, 3)).await;
    assert_eq!(status, StatusCode::CREATED);
    let order_id = order["id"].as_str().unwrap().to_string();

    let terminal = await_terminal_event(&app, &order_id).await;
    assert_eq!(terminal.status.as_str(), "FAIL");
    assert!(
        terminal
            .history
            .iter()
            .any(|entry| entry.message == "Fail to update inventory: Product is out of stock!")
    );
    assert_eq!(
        terminal.history.last().unwrap().message,
        "Saga finished with errors!"
    );
}

#[tokio::test]
async fn test_unknown_product_saga_terminates_with_errors() {
    let app = setup().await;

    let (status, order) = post_order(&app, order_body("GADGETS", 500, 1)).await;
    assert_eq!(status, StatusCode::CREATED);
    let order_id = order["id"].as_str().unwrap().to_string();

    let terminal = await_terminal_event(&app, &order_id).await;
    assert_eq!(terminal.status.as_str(), "FAIL");
    assert_eq!(terminal.history.len(), 3);
}

#[tokio::test]
async fn test_find_all_lists_every_logged_version() {
    let app = setup().await;

    let (_, first) = post_order(&app, order_body("MUSIC", 500, 1)).await;
    let (_, second) = post_order(&app, order_body("MOVIES", 700, 1)).await;

    await_terminal_event(&app, first["id"].as_str().unwrap()).await;
    await_terminal_event(&app, second["id"].as_str().unwrap()).await;

    let (status, json) = get_json(&app, "/api/event/all").await;
    assert_eq!(status, StatusCode::OK);
    let events = json.as_array().unwrap();
    // Two initial versions and two terminal versions.
    assert_eq!(events.len(), 4);
}
