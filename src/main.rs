// Main entry point - Dependency injection and server setup
use std::{net::SocketAddr, sync::Arc, time::Duration};
use axum::{Router, routing::{get, post}};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use sensor_insight::application::command_service::CommandService;
use sensor_insight::application::insight_session::SessionOptions;
use sensor_insight::application::sample_source::SourceRegistry;
use sensor_insight::application::streaming_service::StreamingInsightService;
use sensor_insight::domain::window::SystemClock;
use sensor_insight::infrastructure::config::load_app_config;
use sensor_insight::infrastructure::sensor_hub::SensorHub;
use sensor_insight::presentation::app_state::AppState;
use sensor_insight::presentation::handlers::{
    clear_logs, health_check, list_logs, list_sources, post_command, stream_insight,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_app_config()?;

    // Create sensor hubs (infrastructure layer) and start their drivers
    let mut registry = SourceRegistry::new();
    for source in &config.sources {
        let hub = Arc::new(SensorHub::new(&source.name, source.sensors.clone()));
        let _drivers = hub.spawn_simulation();
        registry.register(hub);
    }

    // Create services (application layer)
    let options = SessionOptions {
        span: config.window.into(),
        policy: config.store.duplicates,
        color_seed: config.store.color_seed,
        clock: Arc::new(SystemClock),
    };
    let streaming_service = StreamingInsightService::new(
        registry.clone(),
        options,
        Duration::from_millis(config.stream.tick_ms.max(1)),
    );
    let command_service = CommandService::new(registry.clone(), config.log.capacity);

    // Create application state
    let state = Arc::new(AppState {
        registry,
        streaming_service,
        command_service,
    });

    // Build router (presentation layer)
    // Snapshot frames are compressed individually, so no CompressionLayer here
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/sensors", get(list_sources))
        .route("/insight/:id/stream", get(stream_insight))
        .route("/commands", post(post_command))
        .route("/logs", get(list_logs).delete(clear_logs))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config.server.addr.parse()?;
    tracing::info!("Starting sensor-insight service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
