use thiserror::Error;
use tracing::debug;

use crate::{
    models::{confirmation::ConfirmationGate, store::TaskStore},
    storage::{Storage, StorageError, save_store},
};

#[derive(Debug, Error)]
pub enum ConfirmError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Runs whatever the gate holds and persists the result. Returns `false` when
/// nothing was pending.
pub fn confirm_pending(
    store: &mut TaskStore,
    gate: &mut ConfirmationGate,
    storage: &impl Storage,
) -> Result<bool, ConfirmError> {
    let Some(next) = gate.confirm(store) else {
        return Ok(false);
    };

    if next != *store {
        save_store(storage, &next)?;
        *store = next;
    } else {
        debug!("confirmed action changed nothing");
    }

    Ok(true)
}

pub fn cancel_pending(gate: &mut ConfirmationGate) {
    gate.cancel();
}
