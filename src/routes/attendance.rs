use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::app_state::AppState;
use crate::models::attendance::{AbsentRecord, FinalizeReport, PresentRecord};
use crate::routes::error::ConsoleError;
use crate::services::export::{self, ExportKind};
use crate::services::filter::RosterFilter;
use crate::services::notify;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Defaults to today's local date.
    pub date: Option<NaiveDate>,
    #[serde(rename = "class")]
    pub class_name: Option<String>,
    pub search: Option<String>,
}

impl ListQuery {
    fn date(&self) -> NaiveDate {
        self.date.unwrap_or_else(|| Local::now().date_naive())
    }

    fn filter(&self) -> RosterFilter {
        RosterFilter {
            class_name: self.class_name.clone(),
            search: self.search.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct FinalizeRequest {
    #[serde(default)]
    pub confirm: bool,
}

/// An absent row plus the link that opens a message to the parent.
#[derive(Debug, Serialize)]
pub struct AbsentEntry {
    #[serde(flatten)]
    pub record: AbsentRecord,
    pub notify_link: Option<String>,
}

/// GET /api/attendance/present?date=&class=&search=
pub async fn present(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<PresentRecord>>, ConsoleError> {
    Ok(Json(load_present(&state, &query).await?))
}

/// GET /api/attendance/absent?date=&class=&search=
pub async fn absent(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<AbsentEntry>>, ConsoleError> {
    let country_code = state.config.notify_country_code.as_deref();
    let entries = load_absent(&state, &query)
        .await?
        .into_iter()
        .map(|record| {
            let message = record
                .message
                .clone()
                .unwrap_or_else(|| notify::absence_message(&record.student_name));
            let notify_link = notify::whatsapp_link(&record.contact, &message, country_code)
                .inspect_err(|e| tracing::debug!(roll_no = record.roll_no, error = %e, "No notify link"))
                .ok();
            AbsentEntry {
                record,
                notify_link,
            }
        })
        .collect();
    Ok(Json(entries))
}

/// GET /api/attendance/{present|absent}/export?date=&class=&search=
pub async fn export_csv(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ConsoleError> {
    let kind: ExportKind = kind
        .parse()
        .map_err(|_| ConsoleError::NotFound(format!("unknown export '{kind}'")))?;

    let csv = match kind {
        ExportKind::Present => export::to_csv(&load_present(&state, &query).await?)?,
        ExportKind::Absent => export::to_csv(&load_absent(&state, &query).await?)?,
    };
    let filename = export::file_name(kind, query.filter().class(), query.date());

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        csv,
    ))
}

/// POST /api/attendance/finalize  body: `{"confirm": true}`
pub async fn finalize(
    State(state): State<AppState>,
    body: Option<Json<FinalizeRequest>>,
) -> Result<Json<FinalizeReport>, ConsoleError> {
    let request = body.map(|Json(request)| request).unwrap_or_default();
    if !request.confirm {
        return Err(ConsoleError::ConfirmationRequired(
            "Finalizing attendance requires confirmation".to_string(),
        ));
    }

    let report = state.api.finalize_attendance().await?;
    tracing::info!(message = %report.message, "Attendance finalized");
    Ok(Json(report))
}

async fn load_present(
    state: &AppState,
    query: &ListQuery,
) -> Result<Vec<PresentRecord>, ConsoleError> {
    let records = state.roster.present_for(query.date()).await?;
    Ok(query.filter().apply(&records))
}

async fn load_absent(
    state: &AppState,
    query: &ListQuery,
) -> Result<Vec<AbsentRecord>, ConsoleError> {
    let filter = query.filter();
    let records = state.api.list_absent(query.date(), filter.class()).await?;
    // the service filters by class; absent rows may not carry class_name
    let search_only = RosterFilter {
        class_name: None,
        search: filter.search,
    };
    Ok(search_only.apply(&records))
}
