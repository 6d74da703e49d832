//! Fingerprint enrollment / deletion workflow
//!
//! Sends the enroll or delete-fingerprint request for one student, then
//! hands the returned command to a [`CommandPoller`] whose events land in
//! that student's slot on the [`StatusBoard`]. A new request for a student
//! cancels any poll still running for them.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use strum::IntoStaticStr;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::models::command::CommandId;
use crate::services::attendance_api::{ApiError, AttendanceClient};
use crate::services::poll_registry::PollRegistry;
use crate::services::poller::{CommandPoller, PollEvent, PollOutcome, PollSink};
use crate::services::roster::Roster;
use crate::services::status_board::{RowStatusKind, StatusBoard};

pub const TIMEOUT_MESSAGE: &str = "Timeout. Please refresh.";

/// Whether the operator confirmed a destructive action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Affirmed,
    Declined,
}

impl From<bool> for Confirmation {
    fn from(confirmed: bool) -> Self {
        if confirmed {
            Confirmation::Affirmed
        } else {
            Confirmation::Declined
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum FingerprintAction {
    Enroll,
    Delete,
}

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("Fingerprint deletion requires confirmation")]
    NotConfirmed,

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// A started command and the task polling it.
#[derive(Debug)]
pub struct PollHandle {
    pub roll_no: u32,
    pub command_id: CommandId,
    pub task: JoinHandle<PollOutcome>,
}

pub struct FingerprintWorkflow {
    api: Arc<AttendanceClient>,
    roster: Arc<Roster>,
    board: StatusBoard,
    registry: PollRegistry,
    poller: CommandPoller,
    device_id: String,
    error_hold: Duration,
}

impl FingerprintWorkflow {
    pub fn new(
        api: Arc<AttendanceClient>,
        roster: Arc<Roster>,
        board: StatusBoard,
        registry: PollRegistry,
        poller: CommandPoller,
        device_id: String,
        error_hold: Duration,
    ) -> Self {
        Self {
            api,
            roster,
            board,
            registry,
            poller,
            device_id,
            error_hold,
        }
    }

    pub async fn start_enrollment(&self, roll_no: u32) -> Result<PollHandle, WorkflowError> {
        self.registry.cancel(roll_no);
        self.board.set(
            roll_no,
            RowStatusKind::Sending,
            "Sending enrollment command...",
        );

        let accepted = self
            .api
            .start_enrollment(roll_no, &self.device_id)
            .await
            .map_err(|e| self.initiation_failed(roll_no, FingerprintAction::Enroll, e))?;

        self.board.set(
            roll_no,
            RowStatusKind::Instruction,
            format!("{} (ID: {})", accepted.instruction, accepted.fingerprint_id),
        );
        info!(
            roll_no,
            command_id = %accepted.command_id,
            fingerprint_id = %accepted.fingerprint_id,
            "Enrollment accepted"
        );

        Ok(self.spawn_poll(roll_no, accepted.command_id, FingerprintAction::Enroll))
    }

    /// Nothing is sent unless `confirmation` is [`Confirmation::Affirmed`].
    pub async fn start_deletion(
        &self,
        roll_no: u32,
        confirmation: Confirmation,
    ) -> Result<PollHandle, WorkflowError> {
        if confirmation != Confirmation::Affirmed {
            return Err(WorkflowError::NotConfirmed);
        }

        self.registry.cancel(roll_no);
        self.board
            .set(roll_no, RowStatusKind::Sending, "Sending deletion...");

        let accepted = self
            .api
            .start_fingerprint_deletion(roll_no, &self.device_id)
            .await
            .map_err(|e| self.initiation_failed(roll_no, FingerprintAction::Delete, e))?;

        self.board
            .set(roll_no, RowStatusKind::Progress, "Deleting...");
        info!(roll_no, command_id = %accepted.command_id, "Fingerprint deletion accepted");

        Ok(self.spawn_poll(roll_no, accepted.command_id, FingerprintAction::Delete))
    }

    fn initiation_failed(
        &self,
        roll_no: u32,
        action: FingerprintAction,
        error: ApiError,
    ) -> WorkflowError {
        let action: &'static str = action.into();
        warn!(roll_no, action, error = %error, "Fingerprint command rejected");
        let generation =
            self.board
                .set(roll_no, RowStatusKind::Error, format!("Error: {}", error.reason()));
        self.board.clear_after(roll_no, generation, self.error_hold);
        WorkflowError::Api(error)
    }

    fn spawn_poll(
        &self,
        roll_no: u32,
        command_id: CommandId,
        action: FingerprintAction,
    ) -> PollHandle {
        let label: &'static str = action.into();
        metrics::counter!("fingerprint_commands_started_total", "kind" => label).increment(1);

        let (ticket, cancel) = self.registry.register(roll_no, command_id.clone());
        let mut sink = RowSink {
            roll_no,
            board: self.board.clone(),
            roster: self.roster.clone(),
            last_write: None,
        };
        let poller = self.poller.clone();
        let registry = self.registry.clone();
        let id = command_id.clone();

        let task = tokio::spawn(async move {
            let outcome = poller.run(&id, &mut sink, cancel).await;
            registry.finish(&ticket);
            outcome
        });

        PollHandle {
            roll_no,
            command_id,
            task,
        }
    }
}

/// Writes poll events into one student's slot.
struct RowSink {
    roll_no: u32,
    board: StatusBoard,
    roster: Arc<Roster>,
    last_write: Option<u64>,
}

#[async_trait]
impl PollSink for RowSink {
    fn emit(&mut self, event: &PollEvent) {
        let (kind, message) = row_message(event);
        self.last_write = Some(self.board.set(self.roll_no, kind, message));
    }

    async fn refresh(&mut self) {
        // failures are already logged and counted by the roster
        let _ = self.roster.reload_students().await;
    }

    fn clear(&mut self) {
        if let Some(generation) = self.last_write {
            self.board.clear_if(self.roll_no, generation);
        }
    }
}

pub fn row_message(event: &PollEvent) -> (RowStatusKind, String) {
    match event {
        PollEvent::Progress(message) => (RowStatusKind::Progress, message.clone()),
        PollEvent::Succeeded(message) if message.is_empty() => {
            (RowStatusKind::Success, "Success!".to_string())
        }
        PollEvent::Succeeded(message) => (RowStatusKind::Success, format!("Success! {message}")),
        PollEvent::Failed(message) => (RowStatusKind::Failure, format!("Failed: {message}")),
        PollEvent::TimedOut => (RowStatusKind::Timeout, TIMEOUT_MESSAGE.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_messages() {
        assert_eq!(
            row_message(&PollEvent::Progress("Place finger again".to_string())),
            (RowStatusKind::Progress, "Place finger again".to_string())
        );
        assert_eq!(
            row_message(&PollEvent::Succeeded("Enrolled as #4".to_string())),
            (RowStatusKind::Success, "Success! Enrolled as #4".to_string())
        );
        assert_eq!(
            row_message(&PollEvent::Succeeded(String::new())),
            (RowStatusKind::Success, "Success!".to_string())
        );
        assert_eq!(
            row_message(&PollEvent::Failed("expired".to_string())),
            (RowStatusKind::Failure, "Failed: expired".to_string())
        );
        assert_eq!(
            row_message(&PollEvent::TimedOut),
            (RowStatusKind::Timeout, TIMEOUT_MESSAGE.to_string())
        );
    }

    #[test]
    fn test_confirmation_from_bool() {
        assert_eq!(Confirmation::from(true), Confirmation::Affirmed);
        assert_eq!(Confirmation::from(false), Confirmation::Declined);
    }
}
