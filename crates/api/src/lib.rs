//! HTTP edge and process wiring for the order saga system.
//!
//! Provides the order intake and event query endpoints, and wires the
//! orchestrator, the three participants, and the notify listener as
//! independent consumers over the bus. With the in-memory bus the whole
//! saga runs inside one process; every component still communicates only
//! through topics, exactly as a distributed deployment would.

pub mod config;
pub mod error;
pub mod intake;
pub mod notify;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use bus::{EventBus, InMemoryEventBus};
use domain::{InMemoryOrderStore, OrderStore};
use event_log::{EventLog, InMemoryEventLog};
use metrics_exporter_prometheus::PrometheusHandle;
use saga::{
    EventSource, InMemoryInventoryLedger, InMemoryPaymentStore, InMemoryProductCatalog,
    InMemoryStockStore, InMemoryValidationStore, Inventory, Orchestrator, ParticipantHandler,
    Payment, ProductValidation, SagaTopology, Topic,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use intake::OrderIntake;
pub use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<B, L, O>(state: Arc<AppState<B, L, O>>, metrics_handle: PrometheusHandle) -> Router
where
    B: EventBus + 'static,
    L: EventLog + 'static,
    O: OrderStore + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/api/order", post(routes::orders::create::<B, L, O>))
        .route("/api/event", get(routes::events::find_by_filters::<B, L, O>))
        .route("/api/event/all", get(routes::events::find_all::<B, L, O>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// The participant-local stores backing the in-process saga services.
#[derive(Clone)]
pub struct SagaStores {
    pub catalog: InMemoryProductCatalog,
    pub stock: InMemoryStockStore,
    pub validation: InMemoryValidationStore,
    pub payments: InMemoryPaymentStore,
    pub inventory_ledger: InMemoryInventoryLedger,
}

impl SagaStores {
    /// Stores seeded with the demo catalog and stock levels.
    pub fn with_demo_data() -> Self {
        Self {
            catalog: InMemoryProductCatalog::with_products([
                "COMIC_BOOKS",
                "BOOKS",
                "MOVIES",
                "MUSIC",
            ]),
            stock: InMemoryStockStore::with_stock([
                ("COMIC_BOOKS", 4),
                ("BOOKS", 2),
                ("MOVIES", 5),
                ("MUSIC", 9),
            ]),
            validation: InMemoryValidationStore::new(),
            payments: InMemoryPaymentStore::new(),
            inventory_ledger: InMemoryInventoryLedger::new(),
        }
    }
}

/// Everything needed to run the saga consumers next to the HTTP server.
pub struct SagaContext<L> {
    pub bus: InMemoryEventBus,
    pub event_log: L,
    pub stores: SagaStores,
}

impl<L: EventLog + Clone + 'static> SagaContext<L> {
    /// Spawns the orchestrator, the three participants, and the notify
    /// listener as background consumers.
    pub fn spawn_workers(&self) -> Vec<tokio::task::JoinHandle<()>> {
        let topology = SagaTopology::order_fulfillment();
        let mut handles = Vec::new();

        let orchestrator = Orchestrator::new(self.bus.clone(), topology.clone());
        handles.push(tokio::spawn(async move {
            let _ = orchestrator.run().await;
        }));

        let handler = ParticipantHandler::new(
            ProductValidation::new(self.stores.catalog.clone(), self.stores.validation.clone()),
            self.bus.clone(),
            *topology
                .step_for(EventSource::ProductValidation)
                .expect("topology misses product validation"),
        );
        handles.push(tokio::spawn(async move {
            let _ = handler.run().await;
        }));

        let handler = ParticipantHandler::new(
            Payment::new(self.stores.payments.clone()),
            self.bus.clone(),
            *topology
                .step_for(EventSource::Payment)
                .expect("topology misses payment"),
        );
        handles.push(tokio::spawn(async move {
            let _ = handler.run().await;
        }));

        let handler = ParticipantHandler::new(
            Inventory::new(self.stores.stock.clone(), self.stores.inventory_ledger.clone()),
            self.bus.clone(),
            *topology
                .step_for(EventSource::Inventory)
                .expect("topology misses inventory"),
        );
        handles.push(tokio::spawn(async move {
            let _ = handler.run().await;
        }));

        let bus = self.bus.clone();
        let log = self.event_log.clone();
        handles.push(tokio::spawn(async move {
            let _ = notify::run_notify_listener(bus, log).await;
        }));

        handles
    }

    /// Waits until every spawned consumer has registered its
    /// subscription, so no early order can race the startup.
    pub async fn ready(&self) {
        let expected = [
            Topic::StartSaga,
            Topic::Orchestrator,
            Topic::ProductValidationSuccess,
            Topic::ProductValidationFail,
            Topic::PaymentSuccess,
            Topic::PaymentFail,
            Topic::InventorySuccess,
            Topic::InventoryFail,
            Topic::NotifyEnding,
        ];
        while !expected
            .iter()
            .all(|topic| self.bus.subscriber_count(topic.as_str()) >= 1)
        {
            tokio::task::yield_now().await;
        }
    }
}

/// Creates the application state and saga context over the given event
/// log implementation.
pub fn create_state<L: EventLog + Clone + 'static>(
    event_log: L,
) -> (
    Arc<AppState<InMemoryEventBus, L, InMemoryOrderStore>>,
    SagaContext<L>,
) {
    let bus = InMemoryEventBus::new();
    let stores = SagaStores::with_demo_data();
    let orders = InMemoryOrderStore::new();

    let intake = OrderIntake::new(bus.clone(), event_log.clone(), orders);
    let state = Arc::new(AppState {
        intake,
        event_log: event_log.clone(),
    });

    (
        state,
        SagaContext {
            bus,
            event_log,
            stores,
        },
    )
}

/// Creates the default application state with in-memory stores.
pub fn create_default_state() -> (
    Arc<AppState<InMemoryEventBus, InMemoryEventLog, InMemoryOrderStore>>,
    SagaContext<InMemoryEventLog>,
) {
    create_state(InMemoryEventLog::new())
}
