use crate::task::types::*;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Errors surfaced by a task store lookup
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("Task {0} not found")]
    NotFound(TaskId),
    #[error("Task store unavailable: {0}")]
    Backend(String),
}

/// Read-only view of the external task-management system.
///
/// This is the only asynchronous boundary of the engine. Implementations are
/// expected to hand each scheduling request a consistent snapshot.
#[async_trait::async_trait]
pub trait TaskStore: Send + Sync {
    /// Resolve a single task by id
    async fn fetch_task(&self, id: TaskId) -> Result<Task, StoreError>;

    /// Resolve the tasks the given task depends on
    async fn fetch_dependencies(&self, id: TaskId) -> Result<Vec<Task>, StoreError>;
}

/// Task store backed by an in-process map
#[derive(Clone, Default)]
pub struct InMemoryTaskStore {
    tasks: Arc<RwLock<HashMap<TaskId, Task>>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with the given tasks
    pub fn from_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        let map = tasks.into_iter().map(|task| (task.id, task)).collect();
        Self {
            tasks: Arc::new(RwLock::new(map)),
        }
    }

    /// Insert or replace a task
    pub async fn insert(&self, task: Task) {
        debug!("Storing task {}", task.id);
        self.tasks.write().await.insert(task.id, task);
    }

    pub async fn remove(&self, id: TaskId) -> Option<Task> {
        self.tasks.write().await.remove(&id)
    }

    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn fetch_task(&self, id: TaskId) -> Result<Task, StoreError> {
        self.tasks
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn fetch_dependencies(&self, id: TaskId) -> Result<Vec<Task>, StoreError> {
        let tasks = self.tasks.read().await;
        let task = tasks.get(&id).ok_or(StoreError::NotFound(id))?;

        // Dangling dependency ids are dropped rather than failing the lookup
        Ok(task
            .dependencies
            .iter()
            .filter_map(|dep_id| tasks.get(dep_id).cloned())
            .collect())
    }
}
