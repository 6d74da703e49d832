use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::app_state::AppState;
use crate::routes::error::ConsoleError;
use crate::services::status_board::RowStatus;
use crate::services::workflow::{Confirmation, PollHandle};

#[derive(Debug, Default, Deserialize)]
pub struct DeleteFingerprintRequest {
    #[serde(default)]
    pub confirm: bool,
}

/// Returned once the service accepted the command; progress shows up on
/// the status board.
#[derive(Debug, Serialize)]
pub struct CommandStarted {
    pub roll_no: u32,
    pub command_id: String,
    pub status: Option<RowStatus>,
}

impl CommandStarted {
    fn new(state: &AppState, handle: PollHandle) -> Self {
        Self {
            roll_no: handle.roll_no,
            command_id: handle.command_id.to_string(),
            status: state.board.get(handle.roll_no),
        }
    }
}

/// POST /api/students/{roll_no}/fingerprint/enroll
pub async fn enroll(
    State(state): State<AppState>,
    Path(roll_no): Path<u32>,
) -> Result<(StatusCode, Json<CommandStarted>), ConsoleError> {
    let handle = state.workflow.start_enrollment(roll_no).await?;
    Ok((StatusCode::ACCEPTED, Json(CommandStarted::new(&state, handle))))
}

/// POST /api/students/{roll_no}/fingerprint/delete  body: `{"confirm": true}`
pub async fn delete_fingerprint(
    State(state): State<AppState>,
    Path(roll_no): Path<u32>,
    body: Option<Json<DeleteFingerprintRequest>>,
) -> Result<(StatusCode, Json<CommandStarted>), ConsoleError> {
    let request = body.map(|Json(request)| request).unwrap_or_default();
    let handle = state
        .workflow
        .start_deletion(roll_no, Confirmation::from(request.confirm))
        .await?;
    Ok((StatusCode::ACCEPTED, Json(CommandStarted::new(&state, handle))))
}

/// GET /api/students/status — every non-empty row slot.
pub async fn status_board(State(state): State<AppState>) -> Json<BTreeMap<u32, RowStatus>> {
    Json(state.board.snapshot())
}
