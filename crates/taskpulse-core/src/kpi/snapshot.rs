//! Persistable KPI snapshots and period-over-period comparison.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{DateRange, HealthStatus, KpiResult};

/// Named scalar metrics that can be compared between two periods.
pub trait ScalarMetrics {
    /// Metrics with a value; absent metrics are left out of the map.
    fn scalar_metrics(&self) -> BTreeMap<&'static str, f64>;
}

/// Scalar summary of a [`KpiResult`], immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiSnapshot {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub range: DateRange,
    pub completed_task_count: usize,
    pub efficiency_score: Option<f64>,
    pub average_efficiency_ratio: Option<f64>,
    pub accuracy_score: Option<f64>,
    pub mean_absolute_percentage_error: Option<f64>,
    pub utilization_score: Option<f64>,
    pub utilization_percentage: f64,
    pub total_person_hours_tracked: f64,
    pub overall_health_score: Option<f64>,
    pub health_status: HealthStatus,
}

impl KpiSnapshot {
    pub fn from_result(result: &KpiResult, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp,
            range: result.range,
            completed_task_count: result.completed_task_count,
            efficiency_score: result.efficiency.efficiency_score,
            average_efficiency_ratio: result.efficiency.average_efficiency_ratio,
            accuracy_score: result.accuracy.accuracy_score,
            mean_absolute_percentage_error: result.accuracy.mean_absolute_percentage_error,
            utilization_score: result.utilization.utilization_score,
            utilization_percentage: result.utilization.utilization_percentage,
            total_person_hours_tracked: result.utilization.total_person_hours_tracked,
            overall_health_score: result.overall_health_score,
            health_status: result.health_status,
        }
    }
}

fn collect(pairs: [(&'static str, Option<f64>); 8]) -> BTreeMap<&'static str, f64> {
    pairs
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name, v)))
        .collect()
}

impl ScalarMetrics for KpiSnapshot {
    fn scalar_metrics(&self) -> BTreeMap<&'static str, f64> {
        collect([
            ("efficiency_score", self.efficiency_score),
            ("average_efficiency_ratio", self.average_efficiency_ratio),
            ("accuracy_score", self.accuracy_score),
            ("mean_absolute_percentage_error", self.mean_absolute_percentage_error),
            ("utilization_score", self.utilization_score),
            ("utilization_percentage", Some(self.utilization_percentage)),
            ("total_person_hours_tracked", Some(self.total_person_hours_tracked)),
            ("overall_health_score", self.overall_health_score),
        ])
    }
}

impl ScalarMetrics for KpiResult {
    fn scalar_metrics(&self) -> BTreeMap<&'static str, f64> {
        collect([
            ("efficiency_score", self.efficiency.efficiency_score),
            ("average_efficiency_ratio", self.efficiency.average_efficiency_ratio),
            ("accuracy_score", self.accuracy.accuracy_score),
            ("mean_absolute_percentage_error", self.accuracy.mean_absolute_percentage_error),
            ("utilization_score", self.utilization.utilization_score),
            ("utilization_percentage", Some(self.utilization.utilization_percentage)),
            ("total_person_hours_tracked", Some(self.utilization.total_person_hours_tracked)),
            ("overall_health_score", self.overall_health_score),
        ])
    }
}

/// `current - previous` for every metric present in both.
pub fn compare_kpis<C, P>(current: &C, previous: &P) -> BTreeMap<&'static str, f64>
where
    C: ScalarMetrics + ?Sized,
    P: ScalarMetrics + ?Sized,
{
    let previous = previous.scalar_metrics();
    current
        .scalar_metrics()
        .into_iter()
        .filter_map(|(name, value)| previous.get(name).map(|prev| (name, value - prev)))
        .collect()
}

/// Newest snapshot compared with the one before it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiTrend {
    pub latest: KpiSnapshot,
    pub previous: Option<KpiSnapshot>,
    pub deltas: BTreeMap<String, f64>,
}

impl KpiTrend {
    /// Order `history` by timestamp and compare the last two entries.
    pub fn from_history(history: &[KpiSnapshot]) -> Option<Self> {
        let mut ordered: Vec<&KpiSnapshot> = history.iter().collect();
        ordered.sort_by_key(|s| s.timestamp);

        let latest = (*ordered.last()?).clone();
        let previous = ordered
            .len()
            .checked_sub(2)
            .map(|i| ordered[i].clone());

        let deltas = previous
            .as_ref()
            .map(|prev| {
                compare_kpis(&latest, prev)
                    .into_iter()
                    .map(|(name, delta)| (name.to_string(), delta))
                    .collect()
            })
            .unwrap_or_default();

        Some(Self {
            latest,
            previous,
            deltas,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kpi::{AccuracyMetrics, EfficiencyMetrics, UtilizationMetrics};
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn result(efficiency: Option<f64>, accuracy: Option<f64>, health: Option<f64>) -> KpiResult {
        let start = Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap();
        KpiResult {
            range: DateRange::new(start, start + Duration::days(7)).unwrap(),
            completed_task_count: 3,
            efficiency: EfficiencyMetrics {
                tasks_under_estimate: 1,
                tasks_on_estimate: 1,
                tasks_over_estimate: 1,
                average_efficiency_ratio: efficiency.map(|_| 1.1),
                efficiency_score: efficiency,
            },
            accuracy: AccuracyMetrics {
                sample_count: 3,
                mean_absolute_percentage_error: accuracy.map(|_| 21.7),
                estimates_within_10_percent: 1,
                estimates_within_25_percent: 2,
                accuracy_score: accuracy,
            },
            utilization: UtilizationMetrics {
                total_person_hours_tracked: 31.25,
                active_contributors: 4,
                total_time_entries: 4,
                available_person_hours: 64.0,
                utilization_percentage: 48.828125,
                is_under_utilized: true,
                is_over_utilized: false,
                utilization_score: Some(48.828125),
            },
            overall_health_score: health,
            health_status: HealthStatus::Fair,
        }
    }

    #[test]
    fn test_snapshot_copies_scalars() {
        let r = result(Some(66.7), Some(50.0), Some(55.2));
        let ts = Utc.with_ymd_and_hms(2026, 3, 9, 8, 0, 0).unwrap();
        let snap = KpiSnapshot::from_result(&r, ts);
        assert_eq!(snap.timestamp, ts);
        assert_eq!(snap.efficiency_score, Some(66.7));
        assert_eq!(snap.health_status, HealthStatus::Fair);
        assert_eq!(snap.scalar_metrics(), r.scalar_metrics());
    }

    #[test]
    fn test_snapshot_json_roundtrip_is_exact() {
        let r = result(Some(200.0 / 3.0), Some(0.1 + 0.2), Some(1.0 / 7.0));
        let snap = KpiSnapshot::from_result(&r, Utc::now());
        let json = serde_json::to_string(&snap).unwrap();
        let back: KpiSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snap);
    }

    #[test]
    fn test_compare_omits_missing_metrics() {
        let current = result(Some(80.0), None, Some(70.0));
        let previous = result(Some(60.0), Some(40.0), None);
        let deltas = compare_kpis(&current, &previous);

        assert_eq!(deltas.get("efficiency_score"), Some(&20.0));
        assert!(!deltas.contains_key("accuracy_score"));
        assert!(!deltas.contains_key("overall_health_score"));
        assert_eq!(deltas.get("utilization_percentage"), Some(&0.0));
    }

    #[test]
    fn test_trend_uses_two_newest() {
        let t0 = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let old = KpiSnapshot::from_result(&result(Some(10.0), None, None), t0);
        let mid = KpiSnapshot::from_result(&result(Some(40.0), None, None), t0 + Duration::days(7));
        let new = KpiSnapshot::from_result(&result(Some(55.0), None, None), t0 + Duration::days(14));

        let trend = KpiTrend::from_history(&[new.clone(), old, mid.clone()]).unwrap();
        assert_eq!(trend.latest, new);
        assert_eq!(trend.previous, Some(mid));
        assert_eq!(trend.deltas.get("efficiency_score"), Some(&15.0));

        let single = KpiTrend::from_history(&[new]).unwrap();
        assert!(single.previous.is_none());
        assert!(single.deltas.is_empty());
        assert!(KpiTrend::from_history(&[]).is_none());
    }

    proptest! {
        #[test]
        fn prop_compare_is_antisymmetric(
            a in proptest::option::of(0.0f64..100.0),
            b in proptest::option::of(0.0f64..100.0),
            c in proptest::option::of(0.0f64..100.0),
            d in proptest::option::of(0.0f64..100.0),
        ) {
            let x = result(a, b, a);
            let y = result(c, d, c);
            let forward = compare_kpis(&x, &y);
            let backward = compare_kpis(&y, &x);
            prop_assert_eq!(forward.len(), backward.len());
            for (name, delta) in &forward {
                prop_assert_eq!(*delta, -backward[name]);
            }
        }
    }
}
