//! Working-hour arithmetic over a fixed daily work window.
//!
//! Converts calendar intervals into the number of hours that fall inside a
//! `[workday_start, workday_end)` window and sizes crews against them.

use chrono::{DateTime, NaiveDateTime, NaiveTime, TimeZone, Timelike};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::WorkdayConfig;

/// Floor applied to every available-hours result so callers can divide by it.
pub const MINIMUM_AVAILABLE_HOURS: f64 = 1.0;

/// Crew-size label for a generated scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScenarioStatus {
    /// Minimum crew, no slack
    Tight,
    /// One extra person
    Safe,
    /// Two extra people
    Buffer,
}

impl ScenarioStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ScenarioStatus::Tight => "Tight",
            ScenarioStatus::Safe => "Safe",
            ScenarioStatus::Buffer => "Buffer",
        }
    }
}

/// One crew-size option for a fixed amount of effort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub people: u32,
    pub hours_per_person: f64,
    pub status: ScenarioStatus,
}

/// Available hours, minimum crew and the three scenarios for one interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrewPlan {
    pub effort_hours: f64,
    pub available_hours: f64,
    pub minimum_personnel: u32,
    pub scenarios: Vec<Scenario>,
}

/// Work-window calculator.
#[derive(Debug, Clone)]
pub struct WorkHoursCalculator {
    /// First working hour of the day (0-23)
    pub workday_start: u32,
    /// Hour the working day ends (exclusive, 1-24)
    pub workday_end: u32,
}

impl Default for WorkHoursCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkHoursCalculator {
    /// 07:00-15:00, 8 hours per day.
    pub fn new() -> Self {
        Self::with_config(&WorkdayConfig::default())
    }

    pub fn with_config(config: &WorkdayConfig) -> Self {
        Self {
            workday_start: config.start_hour,
            workday_end: config.end_hour,
        }
    }

    /// Length of the work window in hours.
    pub fn workday_hours(&self) -> f64 {
        (f64::from(self.workday_end) - f64::from(self.workday_start)).max(0.0)
    }

    /// Working hours inside `[from, to]`, never less than one hour.
    ///
    /// Calendar days are taken in the time zone of `from`; `to` is converted
    /// into it first. When `to` precedes `from` the floor value is returned.
    pub fn calculate_available_hours<Tz: TimeZone>(
        &self,
        from: &DateTime<Tz>,
        to: &DateTime<Tz>,
    ) -> f64 {
        if to < from {
            debug!("available hours requested for reversed interval, using floor");
            return MINIMUM_AVAILABLE_HOURS;
        }
        let to = to.with_timezone(&from.timezone());
        self.available_hours_local(from.naive_local(), to.naive_local())
    }

    /// Same as [`calculate_available_hours`](Self::calculate_available_hours) on wall-clock values.
    pub fn available_hours_local(&self, from: NaiveDateTime, to: NaiveDateTime) -> f64 {
        if to < from {
            return MINIMUM_AVAILABLE_HOURS;
        }

        let window_start = f64::from(self.workday_start);
        let window_end = f64::from(self.workday_end);
        let full_day = self.workday_hours();
        let clamp = |hours: f64| hours.clamp(0.0, full_day);

        let first_day = from.date();
        let last_day = to.date();
        let from_hour = hour_of(from.time());
        let to_hour = hour_of(to.time());

        let mut total = 0.0;
        let mut day = first_day;
        loop {
            if day == first_day && day == last_day {
                total += clamp(window_end.min(to_hour) - from_hour.max(window_start));
            } else if day == first_day {
                total += clamp(window_end - from_hour.max(window_start));
            } else if day == last_day {
                total += clamp(to_hour.min(window_end) - window_start);
            } else {
                total += full_day;
            }

            if day >= last_day {
                break;
            }
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }

        debug!(
            from = %from,
            to = %to,
            total_hours = total,
            "calculated available work hours"
        );
        total.max(MINIMUM_AVAILABLE_HOURS)
    }

    /// Smallest crew that fits `effort_hours` into `available_hours`, at least 1.
    pub fn calculate_minimum_personnel(&self, effort_hours: f64, available_hours: f64) -> u32 {
        if available_hours <= 0.0 || !available_hours.is_finite() || !effort_hours.is_finite() {
            return 1;
        }
        let people = (effort_hours / available_hours).ceil();
        if people < 1.0 {
            1
        } else if people > f64::from(u32::MAX) {
            u32::MAX
        } else {
            people as u32
        }
    }

    /// Tight/Safe/Buffer options at `minimum`, `minimum + 1` and `minimum + 2` people.
    pub fn generate_scenarios(&self, effort_hours: f64, minimum_personnel: u32) -> Vec<Scenario> {
        let minimum = minimum_personnel.max(1);
        [
            (0, ScenarioStatus::Tight),
            (1, ScenarioStatus::Safe),
            (2, ScenarioStatus::Buffer),
        ]
        .into_iter()
        .map(|(extra, status)| {
            let people = minimum.saturating_add(extra);
            Scenario {
                people,
                hours_per_person: effort_hours / f64::from(people),
                status,
            }
        })
        .collect()
    }

    /// Size a crew for `effort_hours` of work between `from` and `to`.
    pub fn plan_crew<Tz: TimeZone>(
        &self,
        effort_hours: f64,
        from: &DateTime<Tz>,
        to: &DateTime<Tz>,
    ) -> CrewPlan {
        let available_hours = self.calculate_available_hours(from, to);
        let minimum_personnel = self.calculate_minimum_personnel(effort_hours, available_hours);
        CrewPlan {
            effort_hours,
            available_hours,
            minimum_personnel,
            scenarios: self.generate_scenarios(effort_hours, minimum_personnel),
        }
    }
}

fn hour_of(time: NaiveTime) -> f64 {
    f64::from(time.num_seconds_from_midnight()) / 3600.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset, Utc};
    use proptest::prelude::*;

    fn at(day: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, h, m, 0).unwrap()
    }

    #[test]
    fn test_reversed_interval_is_floored() {
        let calc = WorkHoursCalculator::new();
        assert_eq!(calc.calculate_available_hours(&at(3, 12, 0), &at(2, 9, 0)), 1.0);
    }

    #[test]
    fn test_same_day_inside_window() {
        let calc = WorkHoursCalculator::new();
        assert_eq!(calc.calculate_available_hours(&at(2, 9, 0), &at(2, 12, 30)), 3.5);
    }

    #[test]
    fn test_same_day_clipped_to_window() {
        let calc = WorkHoursCalculator::new();
        assert_eq!(calc.calculate_available_hours(&at(2, 5, 0), &at(2, 18, 0)), 8.0);
        // Entirely after hours collapses to the floor
        assert_eq!(calc.calculate_available_hours(&at(2, 16, 0), &at(2, 20, 0)), 1.0);
    }

    #[test]
    fn test_multi_day_span() {
        let calc = WorkHoursCalculator::new();
        // 6h on the first day, 8h in between, 2h on the last day
        assert_eq!(calc.calculate_available_hours(&at(2, 9, 0), &at(4, 9, 0)), 16.0);
    }

    #[test]
    fn test_next_day_before_window_opens() {
        let calc = WorkHoursCalculator::new();
        assert_eq!(calc.calculate_available_hours(&at(2, 13, 0), &at(3, 6, 0)), 2.0);
    }

    #[test]
    fn test_uses_local_calendar_of_arguments() {
        let calc = WorkHoursCalculator::new();
        let tz = FixedOffset::east_opt(9 * 3600).unwrap();
        let from = tz.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap();
        let to = tz.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap();
        assert_eq!(calc.calculate_available_hours(&from, &to), 2.0);
    }

    #[test]
    fn test_mixed_offsets_use_calendar_of_from() {
        let calc = WorkHoursCalculator::new();
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        let utc = FixedOffset::east_opt(0).unwrap();
        let from = tokyo.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        // 18:00 in Tokyo
        let to = utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        let same = tokyo.with_ymd_and_hms(2026, 3, 2, 18, 0, 0).unwrap();

        assert_eq!(calc.calculate_available_hours(&from, &to), 6.0);
        assert_eq!(
            calc.calculate_available_hours(&from, &to),
            calc.calculate_available_hours(&from, &same)
        );
    }

    #[test]
    fn test_custom_window() {
        let calc = WorkHoursCalculator {
            workday_start: 9,
            workday_end: 17,
        };
        assert_eq!(calc.workday_hours(), 8.0);
        assert_eq!(calc.calculate_available_hours(&at(2, 8, 0), &at(3, 10, 0)), 9.0);
    }

    #[test]
    fn test_minimum_personnel() {
        let calc = WorkHoursCalculator::new();
        assert_eq!(calc.calculate_minimum_personnel(40.0, 16.0), 3);
        assert_eq!(calc.calculate_minimum_personnel(16.0, 16.0), 1);
        assert_eq!(calc.calculate_minimum_personnel(0.0, 16.0), 1);
        assert_eq!(calc.calculate_minimum_personnel(40.0, 0.0), 1);
        assert_eq!(calc.calculate_minimum_personnel(40.0, -3.0), 1);
    }

    #[test]
    fn test_generate_scenarios() {
        let calc = WorkHoursCalculator::new();
        let scenarios = calc.generate_scenarios(40.0, 3);
        assert_eq!(scenarios.len(), 3);
        assert_eq!(scenarios[0].people, 3);
        assert_eq!(scenarios[0].status, ScenarioStatus::Tight);
        assert_eq!(scenarios[1].people, 4);
        assert_eq!(scenarios[1].hours_per_person, 10.0);
        assert_eq!(scenarios[1].status.label(), "Safe");
        assert_eq!(scenarios[2].people, 5);
        assert_eq!(scenarios[2].hours_per_person, 8.0);
        assert_eq!(scenarios[2].status, ScenarioStatus::Buffer);
    }

    #[test]
    fn test_plan_crew() {
        let calc = WorkHoursCalculator::new();
        let plan = calc.plan_crew(40.0, &at(2, 9, 0), &at(4, 9, 0));
        assert_eq!(plan.available_hours, 16.0);
        assert_eq!(plan.minimum_personnel, 3);
        assert_eq!(plan.scenarios[0].people, 3);
    }

    proptest! {
        #[test]
        fn prop_non_increasing_interval_is_one_hour(
            start_min in 0i64..(60 * 24 * 30),
            back_min in 0i64..(60 * 24 * 30),
        ) {
            let calc = WorkHoursCalculator::new();
            let from = at(1, 0, 0) + Duration::minutes(start_min);
            let to = from - Duration::minutes(back_min);
            prop_assert_eq!(calc.calculate_available_hours(&from, &to), 1.0);
        }

        #[test]
        fn prop_same_day_inside_window_is_literal_difference(
            start_min in (7 * 60i64)..(14 * 60),
            extra_min in 0i64..=(7 * 60),
        ) {
            let calc = WorkHoursCalculator::new();
            let len_min = 60 + extra_min.min(15 * 60 - start_min - 60);
            let from = at(2, 0, 0) + Duration::minutes(start_min);
            let to = from + Duration::minutes(len_min);
            let expected = len_min as f64 / 60.0;
            prop_assert!((calc.calculate_available_hours(&from, &to) - expected).abs() < 1e-9);
        }
    }
}
