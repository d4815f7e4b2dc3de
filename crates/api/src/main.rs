//! API server entry point.

use std::sync::Arc;

use api::config::Config;
use api::{AppState, SagaContext};
use bus::InMemoryEventBus;
use domain::InMemoryOrderStore;
use event_log::{EventLog, PostgresEventLog};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

async fn serve<L: EventLog + Clone + 'static>(
    state: Arc<AppState<InMemoryEventBus, L, InMemoryOrderStore>>,
    context: SagaContext<L>,
    metrics_handle: PrometheusHandle,
    config: &Config,
) {
    // Consumers must be subscribed before the first order can arrive.
    let _workers = context.spawn_workers();
    context.ready().await;

    let app = api::create_app(state, metrics_handle);

    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    match &config.database_url {
        Some(url) => {
            let pool = sqlx::PgPool::connect(url)
                .await
                .expect("failed to connect to Postgres");
            let event_log = PostgresEventLog::new(pool);
            event_log
                .run_migrations()
                .await
                .expect("failed to run migrations");
            tracing::info!("using Postgres event log");

            let (state, context) = api::create_state(event_log);
            serve(state, context, metrics_handle, &config).await;
        }
        None => {
            tracing::info!("using in-memory event log");
            let (state, context) = api::create_default_state();
            serve(state, context, metrics_handle, &config).await;
        }
    }
}
