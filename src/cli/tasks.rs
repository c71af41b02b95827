//! Task file loading
//!
//! A task file lists the tasks to schedule and, optionally, the constraints
//! to schedule them under. The format is picked from the extension:
//! - `.toml` → TOML
//! - anything else → JSON

use crate::schedule::SchedulingConstraints;
use crate::task::{InMemoryTaskStore, Task, TaskId};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum FileError {
    #[error("File '{path}' not found")]
    NotFound { path: PathBuf },

    #[error("IO error reading '{path}': {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Task parsing error in '{path}': {reason}")]
    ParseError { path: PathBuf, reason: String },
}

/// Contents of a task file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskFile {
    #[serde(default)]
    pub tasks: Vec<Task>,
    /// Overrides the configured constraints when present
    #[serde(default)]
    pub constraints: Option<SchedulingConstraints>,
}

impl TaskFile {
    pub fn task_ids(&self) -> Vec<TaskId> {
        self.tasks.iter().map(|task| task.id).collect()
    }

    /// Move the tasks into an in-memory store
    pub fn into_store(self) -> InMemoryTaskStore {
        InMemoryTaskStore::from_tasks(self.tasks)
    }
}

/// Loads task files from disk
pub struct TaskLoader;

impl TaskLoader {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<TaskFile, FileError> {
        let path = path.as_ref().to_path_buf();
        debug!("Loading task file: {:?}", path);

        let content = fs::read_to_string(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => FileError::NotFound { path: path.clone() },
            _ => FileError::IoError {
                path: path.clone(),
                source: e,
            },
        })?;

        let file = if Self::is_toml(&path) {
            Self::parse_toml(&content)
        } else {
            Self::parse_json(&content)
        }
        .map_err(|reason| FileError::ParseError {
            path: path.clone(),
            reason,
        })?;

        debug!("Loaded {} task(s) from {:?}", file.tasks.len(), path);
        Ok(file)
    }

    pub fn parse_json(content: &str) -> Result<TaskFile, String> {
        serde_json::from_str(content).map_err(|e| e.to_string())
    }

    pub fn parse_toml(content: &str) -> Result<TaskFile, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    fn is_toml(path: &Path) -> bool {
        path.extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"))
    }
}
