//! KPI aggregation.
//!
//! Reduces a task set and a time-entry set, filtered to a date range, into
//! efficiency, accuracy and utilization metrics plus a composite health
//! score. Groups without samples report `None` rather than zero.

mod range;
mod report;
mod snapshot;

pub use range::{DateRange, DateRangePreset};
pub use snapshot::{compare_kpis, KpiSnapshot, KpiTrend, ScalarMetrics};

use std::collections::HashSet;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::{ContributorProxy, EngineConfig, HealthBoundaries, KpiConfig};
use crate::task::{Task, TaskIndex, TimeEntry};

/// Composite health bucket, ordered worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// No metric group had samples
    NoData,
    Poor,
    Fair,
    Good,
    Excellent,
}

impl HealthStatus {
    pub fn from_score(score: Option<f64>, boundaries: &HealthBoundaries) -> Self {
        match score {
            None => HealthStatus::NoData,
            Some(s) if s >= boundaries.excellent => HealthStatus::Excellent,
            Some(s) if s >= boundaries.good => HealthStatus::Good,
            Some(s) if s >= boundaries.fair => HealthStatus::Fair,
            Some(_) => HealthStatus::Poor,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HealthStatus::NoData => "No data",
            HealthStatus::Poor => "Poor",
            HealthStatus::Fair => "Fair",
            HealthStatus::Good => "Good",
            HealthStatus::Excellent => "Excellent",
        }
    }
}

/// Actual-vs-estimate distribution of completed tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyMetrics {
    /// ratio below the on-estimate band
    pub tasks_under_estimate: usize,
    pub tasks_on_estimate: usize,
    pub tasks_over_estimate: usize,
    /// Mean of actual / estimated
    pub average_efficiency_ratio: Option<f64>,
    /// Percentage of tasks finished under or on estimate (0-100)
    pub efficiency_score: Option<f64>,
}

impl EfficiencyMetrics {
    pub fn sample_count(&self) -> usize {
        self.tasks_under_estimate + self.tasks_on_estimate + self.tasks_over_estimate
    }
}

/// Estimate error of completed tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccuracyMetrics {
    pub sample_count: usize,
    pub mean_absolute_percentage_error: Option<f64>,
    pub estimates_within_10_percent: usize,
    /// Includes the tasks within 10%
    pub estimates_within_25_percent: usize,
    pub accuracy_score: Option<f64>,
}

/// Tracked person-hours against capacity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtilizationMetrics {
    pub total_person_hours_tracked: f64,
    /// Proxy value, see [`ContributorProxy`]; not a head count
    pub active_contributors: usize,
    pub total_time_entries: usize,
    pub available_person_hours: f64,
    pub utilization_percentage: f64,
    pub is_under_utilized: bool,
    pub is_over_utilized: bool,
    pub utilization_score: Option<f64>,
}

/// KPI snapshot for one date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiResult {
    pub range: DateRange,
    /// Completed, non-archived tasks in range
    pub completed_task_count: usize,
    pub efficiency: EfficiencyMetrics,
    pub accuracy: AccuracyMetrics,
    pub utilization: UtilizationMetrics,
    pub overall_health_score: Option<f64>,
    pub health_status: HealthStatus,
}

/// Computes [`KpiResult`]s.
#[derive(Debug, Clone, Default)]
pub struct KpiManager {
    pub config: KpiConfig,
}

impl KpiManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: KpiConfig) -> Self {
        Self { config }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::with_config(config.kpi.clone())
    }

    /// Aggregate `tasks` and `time_entries` over `range`.
    pub fn calculate(
        &self,
        tasks: &[Task],
        time_entries: &[TimeEntry],
        range: &DateRange,
    ) -> KpiResult {
        let index = TaskIndex::new(tasks, time_entries);

        let completed: Vec<&Task> = tasks
            .iter()
            .filter(|t| t.is_completed && !t.is_archived)
            .filter(|t| t.completed_date.is_some_and(|d| range.contains(d)))
            .collect();

        let samples: Vec<(f64, f64)> = completed
            .iter()
            .filter_map(|t| index.estimate_and_actual(&t.id))
            .collect();

        let entries: Vec<&TimeEntry> = time_entries
            .iter()
            .filter(|e| e.end_time.is_some_and(|end| range.contains(end)))
            .filter(|e| index.get(&e.task_id).map_or(true, |t| !t.is_archived))
            .collect();

        debug!(
            completed = completed.len(),
            samples = samples.len(),
            entries = entries.len(),
            "aggregating KPIs"
        );

        let efficiency = self.efficiency(&samples);
        let accuracy = self.accuracy(&samples);
        let utilization = self.utilization(&entries, range);

        let overall_health_score = self.composite(
            efficiency.efficiency_score,
            accuracy.accuracy_score,
            utilization.utilization_score,
        );
        let health_status = HealthStatus::from_score(overall_health_score, &self.config.health);

        KpiResult {
            range: *range,
            completed_task_count: completed.len(),
            efficiency,
            accuracy,
            utilization,
            overall_health_score,
            health_status,
        }
    }

    fn efficiency(&self, samples: &[(f64, f64)]) -> EfficiencyMetrics {
        let tolerance = self.config.on_estimate_tolerance;
        let mut under = 0;
        let mut on = 0;
        let mut over = 0;
        let mut ratio_sum = 0.0;

        for &(estimated, actual) in samples {
            let ratio = actual / estimated;
            ratio_sum += ratio;
            if ratio < 1.0 - tolerance {
                under += 1;
            } else if ratio <= 1.0 + tolerance {
                on += 1;
            } else {
                over += 1;
            }
            trace!(ratio, "efficiency sample");
        }

        let count = samples.len();
        let (average_efficiency_ratio, efficiency_score) = if count == 0 {
            (None, None)
        } else {
            (
                Some(ratio_sum / count as f64),
                Some((under + on) as f64 * 100.0 / count as f64),
            )
        };

        EfficiencyMetrics {
            tasks_under_estimate: under,
            tasks_on_estimate: on,
            tasks_over_estimate: over,
            average_efficiency_ratio,
            efficiency_score,
        }
    }

    fn accuracy(&self, samples: &[(f64, f64)]) -> AccuracyMetrics {
        let errors: Vec<f64> = samples
            .iter()
            .map(|&(estimated, actual)| percentage_error(estimated, actual))
            .collect();

        let within_10 = errors.iter().filter(|e| **e <= 10.0).count();
        let within_25 = errors.iter().filter(|e| **e <= 25.0).count();
        let count = errors.len();

        let (mean_absolute_percentage_error, accuracy_score) = if count == 0 {
            (None, None)
        } else {
            let mape = errors.iter().sum::<f64>() / count as f64;
            let weighted = within_10 as f64 + 0.5 * (within_25 - within_10) as f64;
            (Some(mape), Some(weighted * 100.0 / count as f64))
        };

        AccuracyMetrics {
            sample_count: count,
            mean_absolute_percentage_error,
            estimates_within_10_percent: within_10,
            estimates_within_25_percent: within_25,
            accuracy_score,
        }
    }

    fn utilization(&self, entries: &[&TimeEntry], range: &DateRange) -> UtilizationMetrics {
        let total_person_hours_tracked: f64 = entries.iter().filter_map(|e| e.person_hours()).sum();
        let total_time_entries = entries.len();

        let active_contributors = match self.config.contributor_proxy {
            ContributorProxy::EntryCount => total_time_entries,
            ContributorProxy::PeakPersonnel => entries
                .iter()
                .map(|e| e.personnel_count as usize)
                .max()
                .unwrap_or(0),
            ContributorProxy::DistinctTasks => entries
                .iter()
                .map(|e| e.task_id)
                .collect::<HashSet<_>>()
                .len(),
        };

        let available_person_hours = self.config.available_person_hours_per_day * range.days() as f64;
        let utilization_percentage = if available_person_hours > 0.0 {
            (total_person_hours_tracked / available_person_hours * 100.0).max(0.0)
        } else {
            0.0
        };

        let over_threshold = self.config.over_utilized_above;
        let utilization_score = (total_time_entries > 0).then(|| {
            if utilization_percentage <= over_threshold {
                utilization_percentage.min(100.0)
            } else {
                (100.0 - (utilization_percentage - over_threshold)).max(0.0)
            }
        });

        UtilizationMetrics {
            total_person_hours_tracked,
            active_contributors,
            total_time_entries,
            available_person_hours,
            utilization_percentage,
            is_under_utilized: total_time_entries > 0
                && utilization_percentage < self.config.under_utilized_below,
            is_over_utilized: total_time_entries > 0 && utilization_percentage > over_threshold,
            utilization_score,
        }
    }

    fn composite(
        &self,
        efficiency: Option<f64>,
        accuracy: Option<f64>,
        utilization: Option<f64>,
    ) -> Option<f64> {
        let weights = &self.config.weights;
        let parts = [
            (efficiency, weights.efficiency),
            (accuracy, weights.accuracy),
            (utilization, weights.utilization),
        ];

        let (sum, weight) = parts
            .iter()
            .filter_map(|(score, w)| score.map(|s| (s, *w)))
            .filter(|(_, w)| *w > 0.0)
            .fold((0.0, 0.0), |(sum, total), (s, w)| (sum + s * w, total + w));

        (weight > 0.0).then(|| sum / weight)
    }

    /// `actual / estimated` for one task, ignoring date ranges.
    pub fn task_efficiency_ratio(&self, task: &Task, index: &TaskIndex<'_>) -> Option<f64> {
        index
            .estimate_and_actual(&task.id)
            .map(|(estimated, actual)| actual / estimated)
    }

    /// Absolute percentage error of one task's estimate.
    pub fn task_accuracy_error(&self, task: &Task, index: &TaskIndex<'_>) -> Option<f64> {
        index
            .estimate_and_actual(&task.id)
            .map(|(estimated, actual)| percentage_error(estimated, actual))
    }

    /// Whether tracked time stayed inside the upper edge of the on-estimate band.
    pub fn was_task_completed_within_estimate(&self, task: &Task, index: &TaskIndex<'_>) -> bool {
        self.task_efficiency_ratio(task, index)
            .is_some_and(|ratio| ratio <= 1.0 + self.config.on_estimate_tolerance)
    }

    /// Lightweight copy of the scalar fields, stamped now.
    pub fn create_snapshot(&self, result: &KpiResult) -> KpiSnapshot {
        KpiSnapshot::from_result(result, Utc::now())
    }
}

fn percentage_error(estimated: f64, actual: f64) -> f64 {
    (actual - estimated).abs() * 100.0 / estimated
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone};

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
    }

    fn week() -> DateRange {
        DateRange::new(base() - Duration::hours(9), base() + Duration::days(5)).unwrap()
    }

    fn finished(est_min: u64, actual_min: i64) -> (Task, TimeEntry) {
        let end = base() + Duration::minutes(actual_min);
        let task = Task::new("t", base())
            .with_estimate_minutes(est_min)
            .completed_at(end);
        let entry = TimeEntry::new(task.id, base(), end);
        (task, entry)
    }

    #[test]
    fn test_health_status_boundaries() {
        let b = HealthBoundaries::default();
        assert_eq!(HealthStatus::from_score(None, &b), HealthStatus::NoData);
        assert_eq!(HealthStatus::from_score(Some(80.0), &b), HealthStatus::Excellent);
        assert_eq!(HealthStatus::from_score(Some(79.9), &b), HealthStatus::Good);
        assert_eq!(HealthStatus::from_score(Some(60.0), &b), HealthStatus::Good);
        assert_eq!(HealthStatus::from_score(Some(40.0), &b), HealthStatus::Fair);
        assert_eq!(HealthStatus::from_score(Some(39.0), &b), HealthStatus::Poor);
        assert!(HealthStatus::Excellent > HealthStatus::Poor);
    }

    #[test]
    fn test_efficiency_buckets() {
        let (t1, e1) = finished(60, 50);
        let (t2, e2) = finished(60, 90);
        let (t3, e3) = finished(60, 61);
        let manager = KpiManager::new();
        let result = manager.calculate(&[t1, t2, t3], &[e1, e2, e3], &week());

        assert_eq!(result.efficiency.tasks_under_estimate, 1);
        assert_eq!(result.efficiency.tasks_over_estimate, 1);
        assert_eq!(result.efficiency.tasks_on_estimate, 1);
        let avg = result.efficiency.average_efficiency_ratio.unwrap();
        assert!((avg - (50.0 / 60.0 + 1.5 + 61.0 / 60.0) / 3.0).abs() < 1e-9);
        assert!((result.efficiency.efficiency_score.unwrap() - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_accuracy_thresholds() {
        let (t1, e1) = finished(60, 66); // 10%
        let (t2, e2) = finished(60, 75); // 25%
        let (t3, e3) = finished(60, 90); // 50%
        let manager = KpiManager::new();
        let result = manager.calculate(&[t1, t2, t3], &[e1, e2, e3], &week());

        assert_eq!(result.accuracy.estimates_within_10_percent, 1);
        assert_eq!(result.accuracy.estimates_within_25_percent, 2);
        assert!((result.accuracy.mean_absolute_percentage_error.unwrap() - 85.0 / 3.0).abs() < 1e-9);
        assert!((result.accuracy.accuracy_score.unwrap() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_input_is_no_data() {
        let manager = KpiManager::new();
        let result = manager.calculate(&[], &[], &week());
        assert!(result.efficiency.average_efficiency_ratio.is_none());
        assert!(result.efficiency.efficiency_score.is_none());
        assert!(result.accuracy.mean_absolute_percentage_error.is_none());
        assert!(result.utilization.utilization_score.is_none());
        assert!(result.overall_health_score.is_none());
        assert_eq!(result.health_status, HealthStatus::NoData);
        assert_eq!(result.utilization.total_person_hours_tracked, 0.0);
    }

    #[test]
    fn test_out_of_range_and_archived_are_excluded() {
        let (t1, e1) = finished(60, 60);
        let (mut t2, e2) = finished(60, 60);
        t2.completed_date = Some(base() + Duration::days(30));
        let (t3, e3) = finished(60, 60);
        let t3 = t3.archived();
        let open = TimeEntry::open(t1.id, base());

        let manager = KpiManager::new();
        let result = manager.calculate(&[t1, t2, t3], &[e1, e2, e3, open], &week());

        assert_eq!(result.completed_task_count, 1);
        assert_eq!(result.efficiency.sample_count(), 1);
        // t2's entry still closes in range; t3's entry belongs to an archived task
        assert_eq!(result.utilization.total_time_entries, 2);
    }

    #[test]
    fn test_utilization_against_capacity() {
        let task = Task::new("crew work", base());
        let entries = vec![
            TimeEntry::new(task.id, base(), base() + Duration::hours(4)).with_personnel(2),
            TimeEntry::new(task.id, base(), base() + Duration::hours(2)).with_personnel(3),
        ];
        let range = DateRange::new(base() - Duration::hours(9), base() + Duration::hours(14)).unwrap();
        let manager = KpiManager::new();
        let result = manager.calculate(&[task], &entries, &range);

        let u = &result.utilization;
        assert_eq!(u.total_person_hours_tracked, 14.0);
        assert_eq!(u.available_person_hours, 8.0);
        assert_eq!(u.utilization_percentage, 175.0);
        assert!(u.is_over_utilized);
        assert!(!u.is_under_utilized);
        assert_eq!(u.utilization_score, Some(25.0));
        assert_eq!(u.active_contributors, 2);
    }

    #[test]
    fn test_no_entries_is_not_under_utilized() {
        let (task, _) = finished(60, 50);
        let result = KpiManager::new().calculate(&[task], &[], &week());

        let u = &result.utilization;
        assert_eq!(u.total_time_entries, 0);
        assert_eq!(u.utilization_score, None);
        assert!(!u.is_under_utilized);
        assert!(!u.is_over_utilized);
    }

    #[test]
    fn test_contributor_proxies() {
        let a = Task::new("a", base());
        let b = Task::new("b", base());
        let entries = vec![
            TimeEntry::new(a.id, base(), base() + Duration::hours(1)).with_personnel(4),
            TimeEntry::new(a.id, base(), base() + Duration::hours(1)),
            TimeEntry::new(b.id, base(), base() + Duration::hours(1)),
        ];
        let tasks = vec![a, b];

        let mut config = KpiConfig::default();
        config.contributor_proxy = ContributorProxy::PeakPersonnel;
        let peak = KpiManager::with_config(config.clone()).calculate(&tasks, &entries, &week());
        assert_eq!(peak.utilization.active_contributors, 4);

        config.contributor_proxy = ContributorProxy::DistinctTasks;
        let distinct = KpiManager::with_config(config).calculate(&tasks, &entries, &week());
        assert_eq!(distinct.utilization.active_contributors, 2);
    }

    #[test]
    fn test_composite_respects_weights() {
        let manager = KpiManager::new();
        assert_eq!(manager.composite(Some(90.0), Some(60.0), None), Some(75.0));
        assert_eq!(manager.composite(None, None, None), None);

        let mut config = KpiConfig::default();
        config.weights.accuracy = 3.0;
        config.weights.utilization = 0.0;
        let weighted = KpiManager::with_config(config);
        assert_eq!(weighted.composite(Some(100.0), Some(60.0), Some(0.0)), Some(70.0));
    }

    #[test]
    fn test_single_task_helpers() {
        let (task, entry) = finished(60, 90);
        let bare = Task::new("no estimate", base());
        let tasks = vec![task.clone(), bare.clone()];
        let entries = vec![entry];
        let index = TaskIndex::new(&tasks, &entries);
        let manager = KpiManager::new();

        assert_eq!(manager.task_efficiency_ratio(&task, &index), Some(1.5));
        assert_eq!(manager.task_accuracy_error(&task, &index), Some(50.0));
        assert!(!manager.was_task_completed_within_estimate(&task, &index));

        assert!(manager.task_efficiency_ratio(&bare, &index).is_none());
        assert!(manager.task_accuracy_error(&bare, &index).is_none());
        assert!(!manager.was_task_completed_within_estimate(&bare, &index));
    }
}
