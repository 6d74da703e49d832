use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::app_state::AppState;
use crate::models::student::{Device, NewStudent, Student};
use crate::routes::error::ConsoleError;
use crate::services::filter::RosterFilter;
use crate::services::roster::DashboardSummary;

#[derive(Debug, Deserialize)]
pub struct ConfirmQuery {
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// GET /api/dashboard
pub async fn dashboard(State(state): State<AppState>) -> Json<DashboardSummary> {
    Json(state.roster.summary())
}

/// GET /api/students?class=&search=
pub async fn list_students(
    State(state): State<AppState>,
    Query(filter): Query<RosterFilter>,
) -> Json<Vec<Student>> {
    Json(filter.apply(&state.roster.students()))
}

/// POST /api/students/reload
pub async fn reload_roster(
    State(state): State<AppState>,
) -> Result<Json<Vec<Student>>, ConsoleError> {
    state.roster.reload_students().await?;
    Ok(Json(state.roster.students()))
}

/// POST /api/students — validate locally, then forward to the service.
pub async fn create_student(
    State(state): State<AppState>,
    Json(form): Json<NewStudent>,
) -> Result<(StatusCode, Json<MessageResponse>), ConsoleError> {
    form.validate()?;
    state.api.create_student(&form).await?;
    tracing::info!(roll_no = form.roll_no, "Student added");

    // the student exists either way; a stale cache is recoverable
    let _ = state.roster.reload_students().await;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "Student added successfully".to_string(),
        }),
    ))
}

/// DELETE /api/students/{roll_no}?confirm=true
pub async fn delete_student(
    State(state): State<AppState>,
    Path(roll_no): Path<u32>,
    Query(query): Query<ConfirmQuery>,
) -> Result<Json<MessageResponse>, ConsoleError> {
    if !query.confirm {
        return Err(ConsoleError::ConfirmationRequired(
            "Deleting a student requires confirmation".to_string(),
        ));
    }

    state.api.delete_student(roll_no).await?;
    state.polls.cancel(roll_no);
    state.board.clear(roll_no);
    tracing::info!(roll_no, "Student deleted");

    let _ = state.roster.reload_students().await;

    Ok(Json(MessageResponse {
        message: "Student deleted successfully".to_string(),
    }))
}

/// GET /api/devices
pub async fn list_devices(State(state): State<AppState>) -> Json<Vec<Device>> {
    Json(state.roster.devices())
}
