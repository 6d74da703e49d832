use axum::routing::{delete, get, post};
use axum::Router;

use crate::app_state::AppState;

pub mod attendance;
pub mod error;
pub mod fingerprint;
pub mod health;
pub mod metrics;
pub mod students;

/// Console routes, without the Prometheus endpoint (it has its own state).
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/dashboard", get(students::dashboard))
        .route(
            "/api/students",
            get(students::list_students).post(students::create_student),
        )
        .route("/api/students/reload", post(students::reload_roster))
        .route("/api/students/status", get(fingerprint::status_board))
        .route("/api/students/{roll_no}", delete(students::delete_student))
        .route(
            "/api/students/{roll_no}/fingerprint/enroll",
            post(fingerprint::enroll),
        )
        .route(
            "/api/students/{roll_no}/fingerprint/delete",
            post(fingerprint::delete_fingerprint),
        )
        .route("/api/devices", get(students::list_devices))
        .route("/api/attendance/present", get(attendance::present))
        .route("/api/attendance/absent", get(attendance::absent))
        .route("/api/attendance/{kind}/export", get(attendance::export_csv))
        .route("/api/attendance/finalize", post(attendance::finalize))
        .with_state(state)
}
