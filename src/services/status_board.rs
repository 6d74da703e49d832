use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use strum::Display;
use tokio::task::JoinHandle;

/// What kind of message a row slot currently shows.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RowStatusKind {
    Sending,
    Instruction,
    Progress,
    Success,
    Failure,
    Timeout,
    Error,
}

/// The status slot of one student row.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RowStatus {
    pub kind: RowStatusKind,
    pub message: String,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    generation: u64,
}

impl RowStatus {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Default)]
struct BoardInner {
    rows: HashMap<u32, RowStatus>,
    next_generation: u64,
}

/// Per-student status messages, keyed by roll number.
///
/// Every write bumps a board-wide generation counter and returns it; a
/// deferred clear only removes the slot if nobody wrote to it since.
#[derive(Debug, Clone, Default)]
pub struct StatusBoard {
    inner: Arc<RwLock<BoardInner>>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, roll_no: u32, kind: RowStatusKind, message: impl Into<String>) -> u64 {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.next_generation += 1;
        let generation = inner.next_generation;
        inner.rows.insert(
            roll_no,
            RowStatus {
                kind,
                message: message.into(),
                updated_at: Utc::now(),
                generation,
            },
        );
        generation
    }

    /// Clear the slot if it still holds the write tagged `generation`.
    pub fn clear_if(&self, roll_no: u32, generation: u64) -> bool {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        match inner.rows.get(&roll_no) {
            Some(row) if row.generation == generation => {
                inner.rows.remove(&roll_no);
                true
            }
            _ => false,
        }
    }

    pub fn clear(&self, roll_no: u32) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .rows
            .remove(&roll_no);
    }

    /// Schedule [`StatusBoard::clear_if`] after `hold`.
    pub fn clear_after(&self, roll_no: u32, generation: u64, hold: Duration) -> JoinHandle<bool> {
        let board = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(hold).await;
            board.clear_if(roll_no, generation)
        })
    }

    pub fn get(&self, roll_no: u32) -> Option<RowStatus> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .rows
            .get(&roll_no)
            .cloned()
    }

    pub fn message(&self, roll_no: u32) -> Option<String> {
        self.get(roll_no).map(|row| row.message)
    }

    /// Every non-empty slot, ordered by roll number.
    pub fn snapshot(&self) -> BTreeMap<u32, RowStatus> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .rows
            .iter()
            .map(|(roll_no, row)| (*roll_no, row.clone()))
            .collect()
    }
}
