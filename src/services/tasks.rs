use thiserror::Error;
use tracing::debug;

use crate::{
    models::{
        confirmation::{ConfirmationGate, DestructiveAction},
        date::{DateKey, Locale},
        store::TaskStore,
        task::{Task, TaskTime},
    },
    storage::{Storage, StorageError, save_store},
};

#[derive(Debug, Error)]
pub enum AddTaskError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub struct AddTaskParameters {
    pub date: String,
    pub text: String,
    pub time: Option<TaskTime>,
}

/// Adds a task and persists the new snapshot. Returns `None` when the input
/// was rejected (blank text or date), in which case nothing is written.
pub fn add_task(
    store: &mut TaskStore,
    storage: &impl Storage,
    parameters: AddTaskParameters,
) -> Result<Option<Task>, AddTaskError> {
    let next = store.add_task(&parameters.date, &parameters.text, parameters.time);
    if next == *store {
        return Ok(None);
    }

    save_store(storage, &next)?;
    *store = next;

    Ok(Some(Task::new(&parameters.text, parameters.time)))
}

#[derive(Debug, Error)]
pub enum ToggleTaskError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub struct ToggleTaskParameters {
    pub date: DateKey,
    pub index: usize,
}

/// Flips completion of a task and persists. Returns the task in its new
/// state, or `None` when there is no task at that position.
pub fn toggle_task(
    store: &mut TaskStore,
    storage: &impl Storage,
    parameters: ToggleTaskParameters,
) -> Result<Option<Task>, ToggleTaskError> {
    let Some(task) = store.task(parameters.date, parameters.index).cloned() else {
        debug!(date = %parameters.date, index = parameters.index, "nothing to toggle");
        return Ok(None);
    };

    let next = store.toggle_completed(parameters.date, parameters.index);
    save_store(storage, &next)?;
    *store = next;

    Ok(Some(Task {
        completed: !task.completed,
        ..task
    }))
}

pub struct RemoveTaskParameters {
    pub date: DateKey,
    pub index: usize,
}

/// Asks for confirmation before removing one task
pub fn request_remove_task(
    gate: &mut ConfirmationGate,
    locale: Locale,
    parameters: RemoveTaskParameters,
) {
    gate.request(
        locale.remove_task_message(),
        DestructiveAction::RemoveTask {
            date: parameters.date,
            index: parameters.index,
        },
    );
}

pub struct RemoveDayParameters {
    pub date: DateKey,
}

/// Asks for confirmation before removing every task of a day
pub fn request_remove_day(
    gate: &mut ConfirmationGate,
    locale: Locale,
    parameters: RemoveDayParameters,
) {
    gate.request(
        locale.remove_day_message(parameters.date),
        DestructiveAction::RemoveDay {
            date: parameters.date,
        },
    );
}
