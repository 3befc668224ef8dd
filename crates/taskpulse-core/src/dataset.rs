//! JSON task/time-entry snapshots.
//!
//! The engine does not own storage; this is the exchange format the CLI and
//! integration tests use to hand a snapshot to the engine.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CoreError, Result};
use crate::task::{Task, TaskIndex, TimeEntry};

/// A full input snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub time_entries: Vec<TimeEntry>,
}

impl Dataset {
    pub fn new(tasks: Vec<Task>, time_entries: Vec<TimeEntry>) -> Self {
        Self {
            tasks,
            time_entries,
        }
    }

    /// Parse a dataset from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CoreError::Dataset {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let dataset: Dataset = serde_json::from_str(&content).map_err(|e| CoreError::Dataset {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        debug!(
            path = %path.display(),
            tasks = dataset.tasks.len(),
            time_entries = dataset.time_entries.len(),
            "loaded dataset"
        );
        Ok(dataset)
    }

    pub fn to_json_file(&self, path: &Path) -> Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn index(&self) -> TaskIndex<'_> {
        TaskIndex::new(&self.tasks, &self.time_entries)
    }

    /// Look up a task by id or by exact title.
    pub fn find_task(&self, key: &str) -> Option<&Task> {
        self.tasks
            .iter()
            .find(|t| t.id.to_string() == key)
            .or_else(|| self.tasks.iter().find(|t| t.title == key))
    }
}
