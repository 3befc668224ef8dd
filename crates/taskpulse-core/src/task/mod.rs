//! Task and time-entry records consumed by the engine.
//!
//! These records are owned and mutated by the surrounding application. The
//! engine only ever reads them; every computation takes a full snapshot of
//! tasks and time entries as arguments.

mod index;

pub use index::TaskIndex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Task identifier.
pub type TaskId = Uuid;

/// Time entry identifier.
pub type TimeEntryId = Uuid;

/// A tracked unit of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    /// Manual or derived estimate in seconds
    #[serde(default)]
    pub estimated_seconds: Option<u64>,
    /// Set when a parent's own estimate deliberately overrides the subtask roll-up
    #[serde(default)]
    pub has_custom_estimate: bool,
    /// Key into the task-type analytics bucket
    #[serde(default)]
    pub task_type: Option<String>,
    #[serde(default)]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    /// Custom productivity rate saved with the task (units per person-hour)
    #[serde(default)]
    pub productivity_rate: Option<f64>,
    /// Crew size the estimate was planned for
    #[serde(default)]
    pub planned_personnel: Option<u32>,
    #[serde(default)]
    pub completed_date: Option<DateTime<Utc>>,
    pub created_date: DateTime<Utc>,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub parent_id: Option<TaskId>,
}

impl Task {
    /// Create an open task with a fresh id.
    pub fn new(title: impl Into<String>, created_date: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            estimated_seconds: None,
            has_custom_estimate: false,
            task_type: None,
            quantity: None,
            unit: None,
            productivity_rate: None,
            planned_personnel: None,
            completed_date: None,
            created_date,
            is_completed: false,
            is_archived: false,
            parent_id: None,
        }
    }

    pub fn with_estimate_seconds(mut self, seconds: u64) -> Self {
        self.estimated_seconds = Some(seconds);
        self
    }

    pub fn with_estimate_minutes(self, minutes: u64) -> Self {
        self.with_estimate_seconds(minutes * 60)
    }

    pub fn with_custom_estimate(mut self, seconds: u64) -> Self {
        self.estimated_seconds = Some(seconds);
        self.has_custom_estimate = true;
        self
    }

    pub fn with_type(mut self, task_type: impl Into<String>) -> Self {
        self.task_type = Some(task_type.into());
        self
    }

    pub fn with_quantity(mut self, quantity: f64, unit: impl Into<String>) -> Self {
        self.quantity = Some(quantity);
        self.unit = Some(unit.into());
        self
    }

    pub fn with_parent(mut self, parent_id: TaskId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_planned_personnel(mut self, personnel: u32) -> Self {
        self.planned_personnel = Some(personnel.max(1));
        self
    }

    /// Mark as completed at the given instant.
    pub fn completed_at(mut self, completed: DateTime<Utc>) -> Self {
        self.is_completed = true;
        self.completed_date = Some(completed);
        self
    }

    pub fn archived(mut self) -> Self {
        self.is_archived = true;
        self
    }

    /// Planned crew size, at least 1.
    pub fn planned_crew(&self) -> u32 {
        self.planned_personnel.unwrap_or(1).max(1)
    }
}

/// A span of tracked work against one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeEntry {
    pub id: TimeEntryId,
    pub task_id: TaskId,
    pub start_time: DateTime<Utc>,
    /// Open entries have no end and are excluded from completed-duration math
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default = "default_personnel")]
    pub personnel_count: u32,
}

fn default_personnel() -> u32 {
    1
}

impl TimeEntry {
    /// Create a closed entry with a single person.
    pub fn new(task_id: TaskId, start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            task_id,
            start_time,
            end_time: Some(end_time),
            personnel_count: 1,
        }
    }

    /// Create an entry that is still running.
    pub fn open(task_id: TaskId, start_time: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            task_id,
            start_time,
            end_time: None,
            personnel_count: 1,
        }
    }

    pub fn with_personnel(mut self, personnel_count: u32) -> Self {
        self.personnel_count = personnel_count.max(1);
        self
    }

    pub fn is_closed(&self) -> bool {
        self.end_time.is_some()
    }

    /// Wall-clock duration in seconds; `None` while the entry is open.
    pub fn duration_seconds(&self) -> Option<f64> {
        let end = self.end_time?;
        let millis = (end - self.start_time).num_milliseconds().max(0);
        Some(millis as f64 / 1000.0)
    }

    /// Duration multiplied by crew size, in hours.
    pub fn person_hours(&self) -> Option<f64> {
        self.duration_seconds()
            .map(|secs| secs / 3600.0 * f64::from(self.personnel_count.max(1)))
    }
}
