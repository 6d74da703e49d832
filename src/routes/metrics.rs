use axum::response::IntoResponse;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

/// Prometheus metrics scrape endpoint.
pub async fn prometheus_metrics(
    axum::extract::State(handle): axum::extract::State<Arc<PrometheusHandle>>,
) -> impl IntoResponse {
    handle.render()
}

/// Register descriptions for the console's metrics.
pub fn describe() {
    metrics::describe_counter!(
        "fingerprint_commands_started_total",
        "Enroll/delete fingerprint commands accepted by the attendance service"
    );
    metrics::describe_counter!(
        "command_poll_outcomes_total",
        "Finished command poll loops by outcome"
    );
    metrics::describe_counter!(
        "command_poll_ticks_total",
        "Command status queries issued"
    );
    metrics::describe_histogram!(
        "command_poll_seconds",
        "Time from first poll tick to loop exit"
    );
    metrics::describe_counter!(
        "roster_reload_failures_total",
        "Failed student/device list reloads"
    );
}
