use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for tasks
pub type TaskId = Uuid;

/// Task record as supplied by the external task store.
///
/// The scheduling engine only reads tasks; it never mutates or persists them.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Task {
    pub id: TaskId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default, with = "crate::duration_secs::option")]
    pub estimated_duration: Option<Duration>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub dependencies: Vec<TaskId>,
}

/// Task priority levels, ordered from lowest to highest
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Task {
    /// Create a task with a fresh id and medium priority
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), title)
    }

    /// Create a task with a caller-chosen id
    pub fn with_id(id: TaskId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            priority: TaskPriority::default(),
            estimated_duration: None,
            due_date: None,
            completed_at: None,
            dependencies: Vec::new(),
        }
    }

    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.estimated_duration = Some(duration);
        self
    }

    pub fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn with_dependencies(mut self, dependencies: Vec<TaskId>) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// Mark the task as completed at the given instant
    pub fn completed(mut self, completed_at: DateTime<Utc>) -> Self {
        self.completed_at = Some(completed_at);
        self
    }

    /// Estimated duration, or `fallback` when the estimate is missing or not positive
    pub fn resolved_duration(&self, fallback: Duration) -> Duration {
        match self.estimated_duration {
            Some(duration) if duration > Duration::zero() => duration,
            _ => fallback,
        }
    }
}

impl TaskPriority {
    /// All priorities from lowest to highest
    pub const ALL: [TaskPriority; 4] = [
        TaskPriority::Low,
        TaskPriority::Medium,
        TaskPriority::High,
        TaskPriority::Critical,
    ];
}
