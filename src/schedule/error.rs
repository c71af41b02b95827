use crate::schedule::types::SchedulingConflict;
use crate::task::{StoreError, TaskId};

/// Why a computed slot list was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReason {
    CriticalConflicts,
    OutsideWorkingHours,
}

/// Allocator settings or constraints that cannot drive slot placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("restriction_step must be positive (got {0}s)")]
    NonPositiveStep(i64),
    #[error("default_task_duration must be positive (got {0}s)")]
    NonPositiveDefaultDuration(i64),
    #[error("break_duration must not be negative (got {0}s)")]
    NegativeBreak(i64),
}

/// Failures returned by scheduling operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchedulingError {
    #[error("No valid tasks found")]
    NoValidTasks,
    #[error("{reason}")]
    Infeasible { task_id: TaskId, reason: String },
    #[error("{reason}")]
    Invalid {
        reason: InvalidReason,
        conflicts: Vec<SchedulingConflict>,
    },
    #[error("Dependency cycle detected ({} cycle(s))", .cycles.len())]
    CycleDetected { cycles: Vec<Vec<TaskId>> },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Invalid scheduling settings: {0}")]
    Settings(#[from] SettingsError),
}

pub type Result<T> = std::result::Result<T, SchedulingError>;

impl std::fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidReason::CriticalConflicts => f.write_str("Critical conflicts detected in schedule"),
            InvalidReason::OutsideWorkingHours => f.write_str("Tasks scheduled outside working hours"),
        }
    }
}

impl SchedulingError {
    pub(crate) fn deadline(task_id: TaskId) -> Self {
        SchedulingError::Infeasible {
            task_id,
            reason: "Cannot schedule task before deadline".to_string(),
        }
    }

    pub(crate) fn out_of_range(task_id: TaskId) -> Self {
        SchedulingError::Infeasible {
            task_id,
            reason: "Task does not fit before the end of the supported time range".to_string(),
        }
    }

    /// True for rejections caused by the computed schedule itself rather than input lookup
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            SchedulingError::Infeasible { .. } | SchedulingError::Invalid { .. }
        )
    }
}
