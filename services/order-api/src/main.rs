use anyhow::Result;
use common::telemetry::{init_telemetry, shutdown_telemetry, TelemetryConfig};
use common::AppConfig;
use futures_util::stream::StreamExt;
use messaging::KafkaOrderConsumer;
use order_service::{OrderConsumer, OrderService};
use order_store::{InMemoryOrderCache, PostgresOrderRepository};
use signal_hook::consts::signal::*;
use signal_hook_tokio::Signals;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

mod handlers;
mod routes;
mod state;

use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    let config = AppConfig::from_env();

    init_telemetry(TelemetryConfig::from_app_config("order-api", &config))
        .map_err(|e| anyhow::anyhow!(e))?;

    info!(
        kafka_brokers = %config.kafka.brokers,
        kafka_topic = %config.kafka.topic,
        consumer_group = %config.kafka.group_id,
        port = config.server.port,
        jaeger = config.enable_jaeger,
        "Starting order service"
    );

    // Connect to database
    info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.database.url())
        .await?;
    sqlx::query("SELECT 1").execute(&pool).await?;
    info!("Database connected successfully");

    let repository = Arc::new(PostgresOrderRepository::new(pool.clone()));
    let service = Arc::new(OrderService::new(
        repository,
        Box::new(InMemoryOrderCache::new()),
    ));

    // Nothing is served before the cache is warm
    service.restore_cache().await?;

    info!("Creating Kafka consumer...");
    let kafka_consumer = KafkaOrderConsumer::new(&config.kafka)?;

    let shutdown = CancellationToken::new();

    let consumer_task = tokio::spawn(
        OrderConsumer::new(Box::new(kafka_consumer), service.clone())
            .run(shutdown.child_token()),
    );

    // Setup signal handling
    let signals = Signals::new([SIGTERM, SIGINT])?;
    let signals_handle = signals.handle();
    let signal_token = shutdown.clone();
    let signal_task = tokio::spawn(async move {
        let mut signals = signals;
        if let Some(signal) = signals.next().await {
            info!(signal, "Received shutdown signal, stopping...");
        }
        signal_token.cancel();
    });

    // Start server
    let app = routes::create_router(AppState::new(service));
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Order API listening on {}", addr);

    let server_token = shutdown.clone();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { server_token.cancelled().await })
            .await
    });

    let mut server_result = Ok(());
    tokio::select! {
        joined = &mut server => {
            server_result = flatten_server_result(joined);
            shutdown.cancel();
        }
        _ = shutdown.cancelled() => {
            match tokio::time::timeout(config.server.shutdown_grace(), &mut server).await {
                Ok(joined) => server_result = flatten_server_result(joined),
                Err(_) => {
                    warn!(
                        grace_secs = config.server.shutdown_grace_secs,
                        "HTTP server did not drain in time, aborting open connections"
                    );
                    server.abort();
                }
            }
        }
    }

    // Cleanup
    info!("Shutting down order service...");
    match consumer_task.await {
        Ok(stats) => info!(
            processed = stats.processed,
            failed = stats.failed,
            "Consumer finished"
        ),
        Err(e) => error!(error = %e, "Consumer task failed"),
    }

    signals_handle.close();
    let _ = signal_task.await;
    pool.close().await;
    info!("Order service stopped");

    // Shutdown telemetry gracefully
    shutdown_telemetry();

    server_result
}

fn flatten_server_result(
    joined: Result<std::io::Result<()>, tokio::task::JoinError>,
) -> Result<()> {
    match joined {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => {
            error!("Server error: {}", e);
            Err(e.into())
        }
        Err(e) => {
            error!("Server task failed: {}", e);
            Err(e.into())
        }
    }
}
