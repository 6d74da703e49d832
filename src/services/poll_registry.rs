use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::oneshot;
use tracing::{debug, info};

use crate::models::command::CommandId;

/// Identifies one registration; stale tickets cannot evict a newer loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollTicket {
    roll_no: u32,
    serial: u64,
}

#[derive(Debug)]
struct ActivePoll {
    serial: u64,
    command_id: CommandId,
    cancel: oneshot::Sender<()>,
}

#[derive(Debug, Default)]
struct RegistryInner {
    active: HashMap<u32, ActivePoll>,
    next_serial: u64,
}

/// At most one live poll loop per student.
///
/// Registering for a student that already has a loop cancels the old one.
#[derive(Debug, Clone, Default)]
pub struct PollRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

impl PollRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &self,
        roll_no: u32,
        command_id: CommandId,
    ) -> (PollTicket, oneshot::Receiver<()>) {
        let (cancel_tx, cancel_rx) = oneshot::channel();
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.next_serial += 1;
        let serial = inner.next_serial;

        let previous = inner.active.insert(
            roll_no,
            ActivePoll {
                serial,
                command_id: command_id.clone(),
                cancel: cancel_tx,
            },
        );
        if let Some(previous) = previous {
            info!(
                roll_no,
                replaced = %previous.command_id,
                command_id = %command_id,
                "Superseding unresolved poll"
            );
            let _ = previous.cancel.send(());
        }

        (PollTicket { roll_no, serial }, cancel_rx)
    }

    /// Drop the registration once its loop has returned.
    pub fn finish(&self, ticket: &PollTicket) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if inner
            .active
            .get(&ticket.roll_no)
            .is_some_and(|poll| poll.serial == ticket.serial)
        {
            inner.active.remove(&ticket.roll_no);
            debug!(roll_no = ticket.roll_no, "Poll registration released");
        }
    }

    /// Cancel the student's loop, if any. Returns whether one was running.
    pub fn cancel(&self, roll_no: u32) -> bool {
        let removed = self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .active
            .remove(&roll_no);
        match removed {
            Some(poll) => {
                info!(roll_no, command_id = %poll.command_id, "Cancelling poll");
                let _ = poll.cancel.send(());
                true
            }
            None => false,
        }
    }

    /// Cancel every outstanding loop (view teardown / shutdown).
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<ActivePoll> = self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .active
            .drain()
            .map(|(_, poll)| poll)
            .collect();
        let count = drained.len();
        for poll in drained {
            let _ = poll.cancel.send(());
        }
        if count > 0 {
            info!(count, "Cancelled outstanding polls");
        }
        count
    }

    pub fn active_command(&self, roll_no: u32) -> Option<CommandId> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .active
            .get(&roll_no)
            .map(|poll| poll.command_id.clone())
    }

    pub fn active_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .active
            .len()
    }
}
