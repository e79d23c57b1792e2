//! Timekeeper server binary.
//!
//! Connects to PostgreSQL, starts the change delivery workers and serves the
//! live change stream at `/ws/changes` until Ctrl-C.

use std::sync::Arc;

use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use timekeeper::adapters::{
    postgres_stores, websocket_router, DeliveryWorkerPool, PostgresUnitOfWork, SubscriberHub,
    WebSocketState,
};
use timekeeper::application::TrackingServices;
use timekeeper::config::{AppConfig, LogFormat};
use timekeeper::ports::ChangePublisher;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load_validated()?;
    init_tracing(&config);

    tracing::info!(
        environment = ?config.server.environment,
        workers = config.delivery.workers,
        topic = %config.delivery.topic,
        "Starting timekeeper"
    );

    let db_pool = config
        .database
        .pool_options()
        .connect(&config.database.url)
        .await?;
    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&db_pool).await?;
        tracing::info!("Database migrations applied");
    }

    let hub = Arc::new(SubscriberHub::from_config(&config.delivery));
    let (publisher, delivery_pool) =
        DeliveryWorkerPool::start((&config.delivery).into(), hub.clone());
    let publisher: Arc<dyn ChangePublisher> = Arc::new(publisher);

    let services = TrackingServices::new(
        Arc::new(PostgresUnitOfWork::new(db_pool.clone())),
        postgres_stores(),
        publisher,
    );

    let app = websocket_router()
        .with_state(WebSocketState::new(hub, config.delivery.topic.as_str()))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(config.server.request_timeout()));

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // No more mutations; flush what is queued before the workers stop
    drop(services);
    let stats = delivery_pool.shutdown().await;
    tracing::info!(
        forwarded = stats.forwarded,
        dropped = stats.dropped,
        failed = stats.failed,
        "Change delivery drained"
    );

    db_pool.close().await;
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    match config.server.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
