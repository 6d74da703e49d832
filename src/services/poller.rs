//! Command status poller
//!
//! Observes one asynchronous hardware command until it reaches a terminal
//! status or the attempt budget runs out. Ticks are strictly sequential:
//! the wait for tick N+1 only starts once tick N's query has resolved, so a
//! slow service can never produce overlapping or out-of-order observations.
//!
//! A failed query is logged and swallowed; it still consumes an attempt.
//! `pending` (and any status the console does not know) produces no event.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use strum::IntoStaticStr;
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::models::command::{CommandId, CommandStatus, CommandStatusResponse};
use crate::services::attendance_api::ApiError;

/// Shown for `in_progress` ticks that carry no message.
pub const PROCESSING_PLACEHOLDER: &str = "Processing...";

/// Anything that can report a command's current status.
#[async_trait]
pub trait CommandSource: Send + Sync {
    async fn command_status(
        &self,
        command_id: &CommandId,
    ) -> Result<CommandStatusResponse, ApiError>;
}

/// Receives the poller's events for one command.
#[async_trait]
pub trait PollSink: Send {
    fn emit(&mut self, event: &PollEvent);

    /// Called once, after the success hold, when the command completed.
    async fn refresh(&mut self);

    /// Called after the display hold of a success or failure.
    fn clear(&mut self);
}

/// Timing and budget for one poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
    pub success_hold: Duration,
    pub failure_hold: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_attempts: 60,
            success_hold: Duration::from_secs(2),
            failure_hold: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollEvent {
    Progress(String),
    Succeeded(String),
    Failed(String),
    TimedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Polling { attempts: u32 },
    Succeeded,
    Failed,
    TimedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum PollOutcome {
    Succeeded,
    Failed,
    TimedOut,
    Cancelled,
}

/// Transition logic, free of timers and I/O.
#[derive(Debug)]
pub struct PollMachine {
    state: PollState,
    max_attempts: u32,
}

impl PollMachine {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            state: PollState::Polling { attempts: 0 },
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    /// Feed one tick's result (`None` when the query failed).
    ///
    /// Returns the event to surface, if any. Once the machine has left
    /// `Polling` further input is ignored.
    pub fn on_response(&mut self, response: Option<&CommandStatusResponse>) -> Option<PollEvent> {
        let PollState::Polling { attempts } = self.state else {
            return None;
        };
        let attempts = attempts + 1;
        self.state = PollState::Polling { attempts };

        let event = response.and_then(|resp| {
            let message = resp.message.clone().filter(|m| !m.is_empty());
            match &resp.status {
                CommandStatus::InProgress => Some(PollEvent::Progress(
                    message.unwrap_or_else(|| PROCESSING_PLACEHOLDER.to_string()),
                )),
                CommandStatus::Completed => {
                    self.state = PollState::Succeeded;
                    Some(PollEvent::Succeeded(message.unwrap_or_default()))
                }
                CommandStatus::Failed | CommandStatus::Expired => {
                    self.state = PollState::Failed;
                    Some(PollEvent::Failed(
                        message.unwrap_or_else(|| resp.status.to_string()),
                    ))
                }
                CommandStatus::Pending | CommandStatus::Unknown(_) => None,
            }
        });

        if matches!(self.state, PollState::Polling { .. }) && attempts >= self.max_attempts {
            self.state = PollState::TimedOut;
            return Some(PollEvent::TimedOut);
        }

        event
    }
}

/// Drives a [`PollMachine`] against a [`CommandSource`] on a timer.
#[derive(Clone)]
pub struct CommandPoller {
    source: Arc<dyn CommandSource>,
    policy: PollPolicy,
}

impl CommandPoller {
    pub fn new(source: Arc<dyn CommandSource>, policy: PollPolicy) -> Self {
        Self { source, policy }
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    /// Poll `command_id` until terminal, timeout, or `cancel` fires (or its
    /// sender is dropped). No query is issued after this returns.
    pub async fn run<S: PollSink>(
        &self,
        command_id: &CommandId,
        sink: &mut S,
        mut cancel: oneshot::Receiver<()>,
    ) -> PollOutcome {
        let started = Instant::now();
        let outcome = self.drive(command_id, sink, &mut cancel).await;

        let label: &'static str = outcome.into();
        metrics::counter!("command_poll_outcomes_total", "outcome" => label).increment(1);
        metrics::histogram!("command_poll_seconds").record(started.elapsed().as_secs_f64());
        info!(command_id = %command_id, outcome = label, "Command polling finished");

        outcome
    }

    async fn drive<S: PollSink>(
        &self,
        command_id: &CommandId,
        sink: &mut S,
        cancel: &mut oneshot::Receiver<()>,
    ) -> PollOutcome {
        let mut machine = PollMachine::new(self.policy.max_attempts);

        loop {
            tokio::select! {
                biased;
                _ = &mut *cancel => return PollOutcome::Cancelled,
                _ = sleep(self.policy.interval) => {}
            }

            let result = tokio::select! {
                biased;
                _ = &mut *cancel => return PollOutcome::Cancelled,
                result = self.source.command_status(command_id) => result,
            };
            metrics::counter!("command_poll_ticks_total").increment(1);

            let response = match result {
                Ok(response) => {
                    debug!(command_id = %command_id, status = %response.status, "Command status");
                    Some(response)
                }
                Err(e) => {
                    warn!(command_id = %command_id, error = %e, "Status check failed, will retry");
                    None
                }
            };

            let Some(event) = machine.on_response(response.as_ref()) else {
                continue;
            };
            // a response racing the cancel belongs to a superseded loop
            if !matches!(cancel.try_recv(), Err(TryRecvError::Empty)) {
                return PollOutcome::Cancelled;
            }
            sink.emit(&event);

            match machine.state() {
                PollState::Polling { .. } => continue,
                PollState::Succeeded => {
                    if !hold(self.policy.success_hold, cancel).await {
                        return PollOutcome::Cancelled;
                    }
                    sink.refresh().await;
                    sink.clear();
                    return PollOutcome::Succeeded;
                }
                PollState::Failed => {
                    if !hold(self.policy.failure_hold, cancel).await {
                        return PollOutcome::Cancelled;
                    }
                    sink.clear();
                    return PollOutcome::Failed;
                }
                PollState::TimedOut => {
                    warn!(
                        command_id = %command_id,
                        attempts = self.policy.max_attempts,
                        "Command did not finish within the attempt budget"
                    );
                    return PollOutcome::TimedOut;
                }
            }
        }
    }
}

/// Wait out a display hold. Returns false if cancelled meanwhile.
async fn hold(duration: Duration, cancel: &mut oneshot::Receiver<()>) -> bool {
    tokio::select! {
        biased;
        _ = &mut *cancel => false,
        _ = sleep(duration) => true,
    }
}
