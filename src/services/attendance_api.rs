//! Remote Attendance Service client
//!
//! Thin reqwest wrapper over the attendance service's REST endpoints. Every
//! call is relative to the configured base URL (which already carries any
//! `/api` prefix) and keeps the service's trailing-slash paths.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

use crate::models::attendance::{AbsentRecord, FinalizeReport, PresentRecord};
use crate::models::command::{
    CommandId, CommandStatusResponse, DeletionAccepted, EnrollmentAccepted, FingerprintRequest,
};
use crate::models::student::{Device, NewStudent, Student};
use crate::services::poller::CommandSource;

/// Error type for attendance service calls.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Attendance service unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Attendance service rejected request (HTTP {status}): {reason}")]
    Rejected { status: u16, reason: String },

    #[error("Unexpected response from attendance service: {0}")]
    Decode(String),
}

impl ApiError {
    /// Text suitable for a row message or notification.
    pub fn reason(&self) -> String {
        match self {
            ApiError::Rejected { reason, .. } => reason.clone(),
            other => other.to_string(),
        }
    }

    pub fn is_rejection(&self) -> bool {
        matches!(self, ApiError::Rejected { .. })
    }
}

/// Client for the remote attendance service.
pub struct AttendanceClient {
    http: Client,
    base_url: String,
}

impl AttendanceClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("attendance-console/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET /students/
    pub async fn list_students(&self) -> Result<Vec<Student>, ApiError> {
        let response = self.http.get(self.url("/students/")).send().await?;
        decode(response).await
    }

    /// POST /students/
    pub async fn create_student(&self, student: &NewStudent) -> Result<(), ApiError> {
        let response = self
            .http
            .post(self.url("/students/"))
            .json(student)
            .send()
            .await?;
        expect_success(response).await
    }

    /// DELETE /students/{roll_no}/
    pub async fn delete_student(&self, roll_no: u32) -> Result<(), ApiError> {
        let response = self
            .http
            .delete(self.url(&format!("/students/{roll_no}/")))
            .send()
            .await?;
        expect_success(response).await
    }

    /// GET /devices/
    pub async fn list_devices(&self) -> Result<Vec<Device>, ApiError> {
        let response = self.http.get(self.url("/devices/")).send().await?;
        decode(response).await
    }

    /// GET /attendance/absent/?date=YYYY-MM-DD[&class=...]
    pub async fn list_absent(
        &self,
        date: NaiveDate,
        class_name: Option<&str>,
    ) -> Result<Vec<AbsentRecord>, ApiError> {
        let mut query = vec![("date", date.format("%Y-%m-%d").to_string())];
        if let Some(class_name) = class_name {
            query.push(("class", class_name.to_string()));
        }

        let response = self
            .http
            .get(self.url("/attendance/absent/"))
            .query(&query)
            .send()
            .await?;
        decode(response).await
    }

    /// GET /attendance/present/?date=YYYY-MM-DD
    pub async fn list_present(&self, date: NaiveDate) -> Result<Vec<PresentRecord>, ApiError> {
        let response = self
            .http
            .get(self.url("/attendance/present/"))
            .query(&[("date", date.format("%Y-%m-%d").to_string())])
            .send()
            .await?;
        decode(response).await
    }

    /// POST /attendance/finalize/
    pub async fn finalize_attendance(&self) -> Result<FinalizeReport, ApiError> {
        let response = self
            .http
            .post(self.url("/attendance/finalize/"))
            .send()
            .await?;
        decode(response).await
    }

    /// POST /student/enroll/
    pub async fn start_enrollment(
        &self,
        roll_no: u32,
        device_id: &str,
    ) -> Result<EnrollmentAccepted, ApiError> {
        let response = self
            .http
            .post(self.url("/student/enroll/"))
            .json(&FingerprintRequest { roll_no, device_id })
            .send()
            .await?;
        decode(response).await
    }

    /// POST /student/delete-fingerprint/
    pub async fn start_fingerprint_deletion(
        &self,
        roll_no: u32,
        device_id: &str,
    ) -> Result<DeletionAccepted, ApiError> {
        let response = self
            .http
            .post(self.url("/student/delete-fingerprint/"))
            .json(&FingerprintRequest { roll_no, device_id })
            .send()
            .await?;
        decode(response).await
    }

    /// GET /command/{command_id}/
    pub async fn command_status(
        &self,
        command_id: &CommandId,
    ) -> Result<CommandStatusResponse, ApiError> {
        let response = self
            .http
            .get(self.url(&format!("/command/{command_id}/")))
            .send()
            .await?;
        decode(response).await
    }
}

#[async_trait]
impl CommandSource for AttendanceClient {
    async fn command_status(
        &self,
        command_id: &CommandId,
    ) -> Result<CommandStatusResponse, ApiError> {
        AttendanceClient::command_status(self, command_id).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let response = check_status(response).await?;
    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| ApiError::Decode(e.to_string()))
}

async fn expect_success(response: Response) -> Result<(), ApiError> {
    check_status(response).await.map(|_| ())
}

async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Rejected {
        status: status.as_u16(),
        reason: rejection_reason(&body).unwrap_or_else(|| status.to_string()),
    })
}

/// Pull a human-readable reason out of an error body.
///
/// Understands `{"error": ...}`, `{"detail": ...}`, `{"message": ...}` and
/// field-keyed validation maps like `{"roll_no": ["already exists"]}`.
fn rejection_reason(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    let Ok(value) = serde_json::from_str::<Value>(trimmed) else {
        return Some(trimmed.to_string());
    };

    let Value::Object(map) = value else {
        return flatten_message(&value);
    };

    for key in ["error", "detail", "message"] {
        if let Some(reason) = map.get(key).and_then(flatten_message) {
            return Some(reason);
        }
    }

    map.iter()
        .find_map(|(field, v)| flatten_message(v).map(|msg| format!("{field}: {msg}")))
}

fn flatten_message(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Array(items) => items.iter().find_map(flatten_message),
        Value::Null => None,
        Value::Object(_) => None,
        other => Some(other.to_string()),
    }
}
