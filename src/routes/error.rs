use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::services::attendance_api::ApiError;
use crate::services::export::ExportError;
use crate::services::workflow::WorkflowError;

#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    ConfirmationRequired(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Upstream(#[from] ApiError),
}

impl IntoResponse for ConsoleError {
    fn into_response(self) -> Response {
        let status = match &self {
            ConsoleError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ConsoleError::ConfirmationRequired(_) => StatusCode::PRECONDITION_REQUIRED,
            ConsoleError::NotFound(_) => StatusCode::NOT_FOUND,
            // pass service-side client errors through, everything else is a bad gateway
            ConsoleError::Upstream(ApiError::Rejected { status, .. }) => {
                StatusCode::from_u16(*status)
                    .ok()
                    .filter(StatusCode::is_client_error)
                    .unwrap_or(StatusCode::BAD_GATEWAY)
            }
            ConsoleError::Upstream(_) => StatusCode::BAD_GATEWAY,
        };
        let message = match &self {
            ConsoleError::Upstream(e) => e.reason(),
            other => other.to_string(),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<WorkflowError> for ConsoleError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::NotConfirmed => ConsoleError::ConfirmationRequired(err.to_string()),
            WorkflowError::Api(e) => ConsoleError::Upstream(e),
        }
    }
}

impl From<ExportError> for ConsoleError {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::Empty => ConsoleError::NotFound(err.to_string()),
            other => ConsoleError::InvalidInput(other.to_string()),
        }
    }
}

impl From<garde::Report> for ConsoleError {
    fn from(report: garde::Report) -> Self {
        ConsoleError::InvalidInput(report.to_string())
    }
}
