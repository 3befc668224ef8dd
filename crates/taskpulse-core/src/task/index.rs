//! Arena view over a task/time-entry snapshot.

use std::collections::{HashMap, HashSet};

use super::{Task, TaskId, TimeEntry};

/// Lookup tables over caller-owned tasks and time entries.
///
/// Parent/subtask relations are resolved through `parent_id` instead of a
/// live object graph, so the roll-up walk cannot form ownership cycles. A
/// malformed snapshot that does contain a parent cycle is cut at the first
/// revisited node.
#[derive(Debug)]
pub struct TaskIndex<'a> {
    tasks: HashMap<TaskId, &'a Task>,
    children: HashMap<TaskId, Vec<TaskId>>,
    entries: HashMap<TaskId, Vec<&'a TimeEntry>>,
}

impl<'a> TaskIndex<'a> {
    pub fn new(tasks: &'a [Task], time_entries: &'a [TimeEntry]) -> Self {
        let mut by_id = HashMap::with_capacity(tasks.len());
        let mut children: HashMap<TaskId, Vec<TaskId>> = HashMap::new();
        for task in tasks {
            by_id.insert(task.id, task);
            if let Some(parent) = task.parent_id {
                children.entry(parent).or_default().push(task.id);
            }
        }

        let mut entries: HashMap<TaskId, Vec<&'a TimeEntry>> = HashMap::new();
        for entry in time_entries {
            entries.entry(entry.task_id).or_default().push(entry);
        }

        Self {
            tasks: by_id,
            children,
            entries,
        }
    }

    pub fn get(&self, id: &TaskId) -> Option<&'a Task> {
        self.tasks.get(id).copied()
    }

    /// Direct subtasks of a task.
    pub fn subtasks(&self, id: &TaskId) -> Vec<&'a Task> {
        self.children
            .get(id)
            .map(|ids| ids.iter().filter_map(|c| self.get(c)).collect())
            .unwrap_or_default()
    }

    /// Time entries recorded against a task (open and closed).
    pub fn entries_for(&self, id: &TaskId) -> &[&'a TimeEntry] {
        self.entries.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Resolved estimate in seconds.
    ///
    /// A task with subtasks uses the sum of the subtasks' effective estimates
    /// unless it carries a custom estimate. Leaf tasks use their own estimate.
    pub fn effective_estimate_seconds(&self, id: &TaskId) -> Option<u64> {
        let mut visited = HashSet::new();
        self.rollup(id, &mut visited)
    }

    fn rollup(&self, id: &TaskId, visited: &mut HashSet<TaskId>) -> Option<u64> {
        if !visited.insert(*id) {
            return None;
        }
        let task = self.get(id)?;

        if task.has_custom_estimate && task.estimated_seconds.is_some() {
            return task.estimated_seconds;
        }

        let child_ids = self.children.get(id).cloned().unwrap_or_default();
        let child_estimates: Vec<u64> = child_ids
            .iter()
            .filter_map(|child| self.rollup(child, visited))
            .collect();

        if child_estimates.is_empty() {
            task.estimated_seconds
        } else {
            Some(child_estimates.iter().sum())
        }
    }

    /// Sum of closed entry durations in seconds; `None` when nothing closed was tracked.
    pub fn actual_seconds(&self, id: &TaskId) -> Option<f64> {
        let durations: Vec<f64> = self
            .entries_for(id)
            .iter()
            .filter_map(|e| e.duration_seconds())
            .collect();
        if durations.is_empty() {
            None
        } else {
            Some(durations.iter().sum())
        }
    }

    /// Sum of closed entry durations weighted by crew size, in hours.
    pub fn actual_person_hours(&self, id: &TaskId) -> Option<f64> {
        let hours: Vec<f64> = self
            .entries_for(id)
            .iter()
            .filter_map(|e| e.person_hours())
            .collect();
        if hours.is_empty() {
            None
        } else {
            Some(hours.iter().sum())
        }
    }

    /// Estimate and actual duration in seconds, both strictly positive.
    pub fn estimate_and_actual(&self, id: &TaskId) -> Option<(f64, f64)> {
        let estimate = self.effective_estimate_seconds(id)? as f64;
        let actual = self.actual_seconds(id)?;
        (estimate > 0.0 && actual > 0.0).then_some((estimate, actual))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_leaf_uses_own_estimate() {
        let tasks = vec![Task::new("leaf", base()).with_estimate_minutes(30)];
        let index = TaskIndex::new(&tasks, &[]);
        assert_eq!(index.effective_estimate_seconds(&tasks[0].id), Some(1800));
    }

    #[test]
    fn test_parent_rolls_up_subtasks() {
        let parent = Task::new("parent", base()).with_estimate_minutes(10);
        let a = Task::new("a", base()).with_estimate_minutes(20).with_parent(parent.id);
        let b = Task::new("b", base()).with_estimate_minutes(40).with_parent(parent.id);
        let c = Task::new("c", base()).with_parent(parent.id);
        let tasks = vec![parent.clone(), a, b, c];
        let index = TaskIndex::new(&tasks, &[]);

        assert_eq!(index.effective_estimate_seconds(&parent.id), Some(3600));
        assert_eq!(index.subtasks(&parent.id).len(), 3);
    }

    #[test]
    fn test_custom_estimate_overrides_rollup() {
        let parent = Task::new("parent", base()).with_custom_estimate(900);
        let a = Task::new("a", base()).with_estimate_minutes(20).with_parent(parent.id);
        let tasks = vec![parent.clone(), a];
        let index = TaskIndex::new(&tasks, &[]);

        assert_eq!(index.effective_estimate_seconds(&parent.id), Some(900));
    }

    #[test]
    fn test_rollup_is_recursive() {
        let root = Task::new("root", base());
        let mid = Task::new("mid", base()).with_parent(root.id);
        let leaf1 = Task::new("leaf1", base()).with_estimate_seconds(100).with_parent(mid.id);
        let leaf2 = Task::new("leaf2", base()).with_estimate_seconds(50).with_parent(root.id);
        let tasks = vec![root.clone(), mid, leaf1, leaf2];
        let index = TaskIndex::new(&tasks, &[]);

        assert_eq!(index.effective_estimate_seconds(&root.id), Some(150));
    }

    #[test]
    fn test_parent_cycle_terminates() {
        let mut a = Task::new("a", base()).with_estimate_seconds(10);
        let mut b = Task::new("b", base()).with_estimate_seconds(20);
        a.parent_id = Some(b.id);
        b.parent_id = Some(a.id);
        let tasks = vec![a.clone(), b];
        let index = TaskIndex::new(&tasks, &[]);

        assert_eq!(index.effective_estimate_seconds(&a.id), Some(20));
    }

    #[test]
    fn test_actuals_skip_open_entries() {
        let task = Task::new("t", base());
        let entries = vec![
            TimeEntry::new(task.id, base(), base() + Duration::minutes(30)).with_personnel(2),
            TimeEntry::open(task.id, base() + Duration::hours(1)),
        ];
        let tasks = vec![task.clone()];
        let index = TaskIndex::new(&tasks, &entries);

        assert_eq!(index.actual_seconds(&task.id), Some(1800.0));
        assert_eq!(index.actual_person_hours(&task.id), Some(1.0));
        assert_eq!(index.entries_for(&task.id).len(), 2);
    }

    #[test]
    fn test_no_closed_entries_means_no_actual() {
        let task = Task::new("t", base()).with_estimate_minutes(30);
        let entries = vec![TimeEntry::open(task.id, base())];
        let tasks = vec![task.clone()];
        let index = TaskIndex::new(&tasks, &entries);

        assert!(index.actual_seconds(&task.id).is_none());
        assert!(index.estimate_and_actual(&task.id).is_none());
    }
}
