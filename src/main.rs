use attendance_console::{app_state::AppState, config::AppConfig, routes};
use axum::routing::get;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load configuration from environment
    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!(
        attendance_api_url = %config.attendance_api_url,
        device_id = %config.device_id,
        "Initializing attendance console"
    );

    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    let prometheus_handle = Arc::new(prometheus_handle);
    routes::metrics::describe();

    let bind_addr = config.bind_addr.clone();
    let device_refresh = config.device_refresh_interval();
    let state = AppState::new(config).expect("Failed to initialize attendance service client");

    // Initial load; the console stays usable if the service is down
    if let Err(e) = state.roster.reload_students().await {
        tracing::warn!(error = %e, "Starting with an empty student list");
    }

    // Device status is refreshed in the background
    let roster = state.roster.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(device_refresh);
        loop {
            ticker.tick().await;
            let _ = roster.reload_devices().await;
        }
    });

    let app = routes::router(state.clone())
        .route(
            "/metrics",
            get(routes::metrics::prometheus_metrics).with_state(prometheus_handle),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Console listening on {}", bind_addr);

    let teardown = state.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            let cancelled = teardown.shutdown();
            tracing::info!(cancelled, "Shutting down");
        })
        .await
        .expect("Server error");
}
