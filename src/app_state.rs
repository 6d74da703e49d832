use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::{
    attendance_api::{ApiError, AttendanceClient},
    poll_registry::PollRegistry,
    poller::CommandPoller,
    roster::Roster,
    status_board::StatusBoard,
    workflow::FingerprintWorkflow,
};

/// Shared application state passed to all route handlers.
///
/// Holds every piece of view-model state the console owns: the status
/// board, the live poll loops and the cached roster.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub api: Arc<AttendanceClient>,
    pub roster: Arc<Roster>,
    pub board: StatusBoard,
    pub polls: PollRegistry,
    pub workflow: Arc<FingerprintWorkflow>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self, ApiError> {
        let api = Arc::new(AttendanceClient::new(
            &config.attendance_api_url,
            config.request_timeout(),
        )?);
        let roster = Arc::new(Roster::new(api.clone(), config.class_names.clone()));
        let board = StatusBoard::new();
        let polls = PollRegistry::new();
        let poller = CommandPoller::new(api.clone(), config.poll_policy());
        let workflow = Arc::new(FingerprintWorkflow::new(
            api.clone(),
            roster.clone(),
            board.clone(),
            polls.clone(),
            poller,
            config.device_id.clone(),
            config.error_hold(),
        ));

        Ok(Self {
            config: Arc::new(config),
            api,
            roster,
            board,
            polls,
            workflow,
        })
    }

    /// Stop every outstanding poll loop so nothing writes to the board
    /// after the view is gone.
    pub fn shutdown(&self) -> usize {
        self.polls.cancel_all()
    }
}
