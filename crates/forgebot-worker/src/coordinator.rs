//! Single-slot work coordinator.
//!
//! The busy check and the transition to running happen inside one lock
//! acquisition, so the slot is safe on a multi-threaded runtime. The
//! permit releases the slot on drop — a panicking task cannot leave the
//! coordinator stuck busy.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use tracing::{error, info};

use crate::error::{Result, WorkError};

/// State of the single work slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    /// No task has run yet.
    Idle,
    /// A task is running; the label names it (e.g. `owner/repo#42`).
    Running(String),
    /// The most recent task finished; retained until superseded.
    Completed(String),
}

/// Coordinates at most one in-flight work task.
#[derive(Clone, Default)]
pub struct WorkCoordinator {
    slot: Arc<Mutex<TaskStatus>>,
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Idle
    }
}

/// Exclusive permission to run the current task. Dropping the permit moves
/// the slot to `Completed`.
pub struct WorkPermit {
    slot: Arc<Mutex<TaskStatus>>,
    label: String,
}

impl WorkCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current slot state.
    pub fn status(&self) -> TaskStatus {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Claim the slot for a new task.
    ///
    /// Fails with [`WorkError::Busy`] if a task is running. There is no
    /// queue and no preemption; the caller retries later.
    pub fn try_start(&self, label: impl Into<String>) -> Result<WorkPermit> {
        let label = label.into();
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let TaskStatus::Running(current) = &*slot {
            return Err(WorkError::Busy {
                current: current.clone(),
            });
        }
        *slot = TaskStatus::Running(label.clone());
        info!(task = %label, "Work slot acquired");
        Ok(WorkPermit {
            slot: Arc::clone(&self.slot),
            label,
        })
    }

    /// Claim the slot and spawn `task` as a background tokio task,
    /// delivering its terminal result over `outcome_tx`.
    ///
    /// Returns immediately after the claim; errors inside the task are
    /// converted to a failure message on the same channel, never
    /// propagated.
    pub fn submit<F>(
        &self,
        label: impl Into<String>,
        outcome_tx: mpsc::Sender<String>,
        task: F,
    ) -> Result<()>
    where
        F: std::future::Future<Output = Result<String>> + Send + 'static,
    {
        let permit = self.try_start(label)?;
        tokio::spawn(async move {
            let message = match task.await {
                Ok(message) => message,
                Err(e) => {
                    error!(task = %permit.label, error = %e, "Work task failed");
                    format!("Work on {} failed: {e}", permit.label)
                }
            };
            if outcome_tx.send(message).await.is_err() {
                error!(task = %permit.label, "Outcome channel closed, result dropped");
            }
            drop(permit);
        });
        Ok(())
    }
}

impl Drop for WorkPermit {
    fn drop(&mut self) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = TaskStatus::Completed(self.label.clone());
        info!(task = %self.label, "Work slot released");
    }
}
