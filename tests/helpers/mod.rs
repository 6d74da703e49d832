//! Test helper utilities: an in-process fake of the remote attendance
//! service, plus console setup with short timings.

#![allow(dead_code)]

use attendance_console::{app_state::AppState, config::AppConfig, routes};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::sleep;

/// Mutable state behind the fake service.
#[derive(Default)]
pub struct FakeState {
    pub students: Vec<Value>,
    pub devices: Vec<Value>,
    pub absent: Vec<Value>,
    pub present: Vec<Value>,
    pub present_unavailable: bool,
    /// Scripted command statuses keyed by roll number; moved to the command
    /// id when an enroll/delete is accepted. Exhausted scripts answer pending.
    pub scripts_by_roll: HashMap<u32, VecDeque<Value>>,
    pub scripts: HashMap<String, VecDeque<Value>>,
    pub enroll_rejections: HashMap<u32, (u16, Value)>,
    pub command_delay: Duration,
    pub next_command: u64,
    pub requests: Vec<String>,
    pub command_in_flight: usize,
    pub command_max_in_flight: usize,
    pub finalized: bool,
    /// Roll numbers whose DELETE answers 500.
    pub delete_failures: Vec<u32>,
}

#[derive(Clone)]
pub struct FakeService {
    pub base_url: String,
    pub state: Arc<Mutex<FakeState>>,
}

impl FakeService {
    pub async fn start() -> Self {
        Self::start_with(FakeState::default()).await
    }

    pub async fn start_with(initial: FakeState) -> Self {
        let state = Arc::new(Mutex::new(initial));
        let app = Router::new()
            .route("/api/students/", get(list_students).post(create_student))
            .route("/api/students/{roll_no}/", delete(delete_student))
            .route("/api/devices/", get(list_devices))
            .route("/api/attendance/absent/", get(list_absent))
            .route("/api/attendance/present/", get(list_present))
            .route("/api/attendance/finalize/", post(finalize))
            .route("/api/student/enroll/", post(enroll))
            .route("/api/student/delete-fingerprint/", post(delete_fingerprint))
            .route("/api/command/{command_id}/", get(command_status))
            .with_state(state.clone());

        let base_url = serve(app).await;
        Self {
            base_url: format!("{base_url}/api"),
            state,
        }
    }

    pub fn script(&self, roll_no: u32, statuses: Vec<Value>) {
        self.state
            .lock()
            .unwrap()
            .scripts_by_roll
            .insert(roll_no, statuses.into());
    }

    pub fn reject_enrollment(&self, roll_no: u32, status: u16, body: Value) {
        self.state
            .lock()
            .unwrap()
            .enroll_rejections
            .insert(roll_no, (status, body));
    }

    pub fn requests_matching(&self, prefix: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .requests
            .iter()
            .filter(|r| r.starts_with(prefix))
            .count()
    }
}

pub fn student(roll_no: u32, name: &str, class_name: &str, enrolled: bool) -> Value {
    json!({
        "roll_no": roll_no,
        "student_name": name,
        "class_name": class_name,
        "identifier_code": null,
        "fingerprint_enrolled": enrolled,
        "fingerprint_id": if enrolled { json!(roll_no) } else { Value::Null },
    })
}

pub fn status(status: &str, message: Option<&str>) -> Value {
    json!({ "status": status, "message": message })
}

/// Console config pointed at `base_url` with millisecond-scale timings.
pub fn fast_config(base_url: &str) -> AppConfig {
    let mut config = AppConfig::with_api_url(base_url);
    config.poll_interval_ms = 20;
    config.poll_max_attempts = 5;
    config.success_hold_ms = 30;
    config.failure_hold_ms = 30;
    config.error_hold_ms = 80;
    config.request_timeout_secs = 5;
    config
}

/// Serve the console router on an ephemeral port; returns its base URL.
pub async fn start_console(state: AppState) -> String {
    serve(routes::router(state)).await
}

/// Wait until `check` holds, polling every 10ms for up to `timeout`.
pub async fn wait_until<F: Fn() -> bool>(timeout: Duration, check: F) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        sleep(Duration::from_millis(10)).await;
    }
    check()
}

async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("No local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Test server error");
    });
    format!("http://{addr}")
}

type Shared = State<Arc<Mutex<FakeState>>>;

fn log(state: &Arc<Mutex<FakeState>>, line: String) {
    state.lock().unwrap().requests.push(line);
}

async fn list_students(State(state): Shared) -> Json<Vec<Value>> {
    log(&state, "GET /students/".to_string());
    Json(state.lock().unwrap().students.clone())
}

async fn create_student(State(state): Shared, Json(body): Json<Value>) -> Response {
    log(&state, "POST /students/".to_string());
    let mut guard = state.lock().unwrap();
    let roll_no = body["roll_no"].as_u64().unwrap_or_default();
    if guard
        .students
        .iter()
        .any(|s| s["roll_no"].as_u64() == Some(roll_no))
    {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "roll_no": ["student with this roll no already exists."] })),
        )
            .into_response();
    }
    guard.students.push(student(
        roll_no as u32,
        body["student_name"].as_str().unwrap_or_default(),
        body["class_name"].as_str().unwrap_or_default(),
        false,
    ));
    (StatusCode::CREATED, Json(json!({ "message": "Student added" }))).into_response()
}

async fn delete_student(State(state): Shared, Path(roll_no): Path<u32>) -> Response {
    log(&state, format!("DELETE /students/{roll_no}/"));
    let mut guard = state.lock().unwrap();
    if guard.delete_failures.contains(&roll_no) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "database unavailable" })),
        )
            .into_response();
    }
    guard
        .students
        .retain(|s| s["roll_no"].as_u64() != Some(u64::from(roll_no)));
    Json(json!({ "message": "Student deleted" })).into_response()
}

async fn list_devices(State(state): Shared) -> Json<Vec<Value>> {
    log(&state, "GET /devices/".to_string());
    Json(state.lock().unwrap().devices.clone())
}

async fn list_absent(
    State(state): Shared,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Vec<Value>> {
    log(
        &state,
        format!(
            "GET /attendance/absent/?date={}&class={}",
            query.get("date").cloned().unwrap_or_default(),
            query.get("class").cloned().unwrap_or_default()
        ),
    );
    Json(state.lock().unwrap().absent.clone())
}

async fn list_present(State(state): Shared) -> Response {
    log(&state, "GET /attendance/present/".to_string());
    let guard = state.lock().unwrap();
    if guard.present_unavailable {
        return (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not found." }))).into_response();
    }
    Json(guard.present.clone()).into_response()
}

async fn finalize(State(state): Shared) -> Json<Value> {
    log(&state, "POST /attendance/finalize/".to_string());
    state.lock().unwrap().finalized = true;
    Json(json!({ "message": "Attendance finalized", "date": "2026-10-19" }))
}

fn accept_command(guard: &mut FakeState, roll_no: u32) -> String {
    guard.next_command += 1;
    let command_id = guard.next_command.to_string();
    let script = guard.scripts_by_roll.remove(&roll_no).unwrap_or_default();
    guard.scripts.insert(command_id.clone(), script);
    command_id
}

async fn enroll(State(state): Shared, Json(body): Json<Value>) -> Response {
    log(&state, "POST /student/enroll/".to_string());
    let roll_no = body["roll_no"].as_u64().unwrap_or_default() as u32;
    let mut guard = state.lock().unwrap();
    if let Some((code, error)) = guard.enroll_rejections.get(&roll_no).cloned() {
        let code = StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST);
        return (code, Json(error)).into_response();
    }
    let command_id = accept_command(&mut guard, roll_no);
    Json(json!({
        "command_id": command_id.parse::<u64>().unwrap(),
        "instruction": "Place finger on scanner",
        "fingerprint_id": roll_no + 100,
        "device_id": body["device_id"],
    }))
    .into_response()
}

async fn delete_fingerprint(State(state): Shared, Json(body): Json<Value>) -> Json<Value> {
    log(&state, "POST /student/delete-fingerprint/".to_string());
    let roll_no = body["roll_no"].as_u64().unwrap_or_default() as u32;
    let mut guard = state.lock().unwrap();
    let command_id = accept_command(&mut guard, roll_no);
    Json(json!({ "command_id": command_id.parse::<u64>().unwrap() }))
}

async fn command_status(State(state): Shared, Path(command_id): Path<String>) -> Json<Value> {
    let delay = {
        let mut guard = state.lock().unwrap();
        guard.requests.push(format!("GET /command/{command_id}/"));
        guard.command_in_flight += 1;
        guard.command_max_in_flight = guard.command_max_in_flight.max(guard.command_in_flight);
        guard.command_delay
    };

    if !delay.is_zero() {
        sleep(delay).await;
    }

    let mut guard = state.lock().unwrap();
    guard.command_in_flight -= 1;
    let next = guard
        .scripts
        .get_mut(&command_id)
        .and_then(VecDeque::pop_front)
        .unwrap_or_else(|| status("pending", None));
    Json(next)
}
