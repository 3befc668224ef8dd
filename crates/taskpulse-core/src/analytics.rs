//! Task-type analytics.
//!
//! Summarizes how completed tasks of one type performed against their
//! estimates: the mean observed productivity and the typical signed overrun.
//! Profiles are rebuilt from the supplied history on every call.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::{EngineConfig, MIN_SAMPLE_THRESHOLD_FLOOR};
use crate::task::{Task, TaskIndex, TimeEntry};

/// Historical estimate-vs-actual profile of one task type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskTypeAnalytics {
    pub task_type: String,
    /// Completed tasks with both an estimate and tracked time
    pub sample_count: usize,
    /// Mean of quantity / actual person-hours; `None` when no sample carries a quantity
    pub mean_productivity: Option<f64>,
    /// Samples that contributed to `mean_productivity`
    pub productivity_sample_count: usize,
    /// Mean signed deviation of actual from estimated effort (positive = overrun)
    pub typical_overrun_percentage: f64,
    pub is_significant: bool,
}

impl TaskTypeAnalytics {
    /// Scale an effort figure by the typical overrun.
    ///
    /// Callers are expected to check `is_significant` first.
    pub fn adjusted_effort(&self, base_hours: f64) -> f64 {
        base_hours * (1.0 + self.typical_overrun_percentage / 100.0)
    }

    /// Get suggested correction message.
    pub fn correction_suggestion(&self) -> String {
        let factor = 1.0 + self.typical_overrun_percentage / 100.0;
        if self.typical_overrun_percentage.abs() < 5.0 {
            format!(
                "{}: Estimates are accurate (factor: {:.2}x)",
                self.task_type, factor
            )
        } else if self.typical_overrun_percentage > 0.0 {
            format!(
                "{}: Multiply estimates by {:.2}x (tasks take ~{:.0}% longer)",
                self.task_type, factor, self.typical_overrun_percentage
            )
        } else {
            format!(
                "{}: Multiply estimates by {:.2}x (tasks finish ~{:.0}% faster)",
                self.task_type,
                factor,
                -self.typical_overrun_percentage
            )
        }
    }
}

/// Builds [`TaskTypeAnalytics`] from task history.
#[derive(Debug, Clone)]
pub struct TaskTypeAnalyzer {
    /// Samples needed before a profile counts as significant
    pub minimum_sample_threshold: usize,
}

impl Default for TaskTypeAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskTypeAnalyzer {
    pub fn new() -> Self {
        Self {
            minimum_sample_threshold: MIN_SAMPLE_THRESHOLD_FLOOR,
        }
    }

    /// Create analyzer with a custom threshold (raised to at least 3).
    pub fn with_threshold(minimum_sample_threshold: usize) -> Self {
        Self {
            minimum_sample_threshold: minimum_sample_threshold.max(MIN_SAMPLE_THRESHOLD_FLOOR),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::with_threshold(config.minimum_sample_threshold())
    }

    /// Profile for `task_type`, or `None` when no task qualifies.
    pub fn calculate(
        &self,
        task_type: &str,
        tasks: &[Task],
        time_entries: &[TimeEntry],
    ) -> Option<TaskTypeAnalytics> {
        let index = TaskIndex::new(tasks, time_entries);
        self.calculate_indexed(task_type, tasks, &index)
    }

    /// Same as [`calculate`](Self::calculate) with a prebuilt index over `tasks`.
    pub fn calculate_indexed(
        &self,
        task_type: &str,
        tasks: &[Task],
        index: &TaskIndex<'_>,
    ) -> Option<TaskTypeAnalytics> {
        let mut overruns = Vec::new();
        let mut productivities = Vec::new();

        for task in tasks {
            if !task.is_completed || task.task_type.as_deref() != Some(task_type) {
                continue;
            }
            let Some(estimate_seconds) = index.effective_estimate_seconds(&task.id) else {
                continue;
            };
            let Some(actual_person_hours) = index.actual_person_hours(&task.id) else {
                continue;
            };
            let estimated_effort = estimate_seconds as f64 / 3600.0 * f64::from(task.planned_crew());
            if estimated_effort <= 0.0 || actual_person_hours <= 0.0 {
                continue;
            }

            let overrun = (actual_person_hours - estimated_effort) / estimated_effort * 100.0;
            trace!(task = %task.id, overrun, "task-type sample");
            overruns.push(overrun);

            if let Some(quantity) = task.quantity.filter(|q| *q > 0.0) {
                productivities.push(quantity / actual_person_hours);
            }
        }

        if overruns.is_empty() {
            debug!(task_type, "no qualifying samples for task type");
            return None;
        }

        let sample_count = overruns.len();
        let typical_overrun_percentage = mean(&overruns);
        let mean_productivity = (!productivities.is_empty()).then(|| mean(&productivities));

        debug!(
            task_type,
            sample_count,
            typical_overrun_percentage,
            "computed task-type analytics"
        );

        Some(TaskTypeAnalytics {
            task_type: task_type.to_string(),
            sample_count,
            mean_productivity,
            productivity_sample_count: productivities.len(),
            typical_overrun_percentage,
            is_significant: sample_count >= self.minimum_sample_threshold,
        })
    }

    /// Profiles for every task type present, most-sampled first.
    pub fn calculate_all(&self, tasks: &[Task], time_entries: &[TimeEntry]) -> Vec<TaskTypeAnalytics> {
        let index = TaskIndex::new(tasks, time_entries);
        let types: BTreeSet<&str> = tasks.iter().filter_map(|t| t.task_type.as_deref()).collect();

        let mut all: Vec<_> = types
            .into_iter()
            .filter_map(|task_type| self.calculate_indexed(task_type, tasks, &index))
            .collect();

        all.sort_by(|a, b| {
            b.sample_count
                .cmp(&a.sample_count)
                .then_with(|| a.task_type.cmp(&b.task_type))
        });
        all
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
