use tracing::debug;

use crate::models::{date::DateKey, store::TaskStore};

/// A mutation that destroys data and therefore waits for confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestructiveAction {
    RemoveTask { date: DateKey, index: usize },
    RemoveDay { date: DateKey },
}

impl DestructiveAction {
    pub fn apply(&self, store: &TaskStore) -> TaskStore {
        match *self {
            DestructiveAction::RemoveTask { date, index } => store.remove_task(date, index),
            DestructiveAction::RemoveDay { date } => store.remove_day(date),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingConfirmation {
    /// What the user is asked to approve
    pub message: String,
    pub action: DestructiveAction,
}

/// Holds at most one destructive action until it is confirmed or cancelled.
/// A new request replaces whatever was pending.
#[derive(Debug, Default)]
pub struct ConfirmationGate {
    pending: Option<PendingConfirmation>,
}

impl ConfirmationGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> Option<&PendingConfirmation> {
        self.pending.as_ref()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn request(&mut self, message: String, action: DestructiveAction) {
        if let Some(replaced) = self.pending.take() {
            debug!(action = ?replaced.action, "discarding unanswered confirmation");
        }
        self.pending = Some(PendingConfirmation { message, action });
    }

    /// Runs the pending action against `store` and returns the resulting
    /// snapshot, or `None` when nothing was pending.
    pub fn confirm(&mut self, store: &TaskStore) -> Option<TaskStore> {
        let pending = self.pending.take()?;
        debug!(action = ?pending.action, "confirmed");
        Some(pending.action.apply(store))
    }

    pub fn cancel(&mut self) {
        if let Some(cancelled) = self.pending.take() {
            debug!(action = ?cancelled.action, "cancelled");
        }
    }
}
