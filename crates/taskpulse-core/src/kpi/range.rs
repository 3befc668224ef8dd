//! Date ranges for KPI filtering.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Named ranges relative to "now" (UTC calendar).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DateRangePreset {
    Today,
    /// ISO week, Monday through Sunday
    ThisWeek,
    ThisMonth,
}

impl FromStr for DateRangePreset {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "today" => Ok(Self::Today),
            "this-week" | "week" => Ok(Self::ThisWeek),
            "this-month" | "month" => Ok(Self::ThisMonth),
            other => Err(ValidationError::InvalidValue {
                field: "preset".to_string(),
                message: format!("unknown range preset '{other}'"),
            }),
        }
    }
}

/// Inclusive `[start, end]` interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// Custom range; `end` must not precede `start`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, ValidationError> {
        if end < start {
            return Err(ValidationError::InvalidTimeRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Whole calendar period containing `now`.
    pub fn preset(preset: DateRangePreset, now: DateTime<Utc>) -> Self {
        let today = now.date_naive();
        let (first, last) = match preset {
            DateRangePreset::Today => (today, today),
            DateRangePreset::ThisWeek => {
                let monday = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
                (monday, monday + Duration::days(6))
            }
            DateRangePreset::ThisMonth => {
                let first = today.with_day(1).unwrap_or(today);
                let next_month = if first.month() == 12 {
                    NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
                } else {
                    NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
                };
                let last = next_month.map_or(today, |d| d - Duration::days(1));
                (first, last)
            }
        };
        Self {
            start: start_of_day(first),
            end: start_of_day(last) + Duration::days(1) - Duration::nanoseconds(1),
        }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }

    /// Calendar days touched by the range, at least 1.
    pub fn days(&self) -> i64 {
        ((self.end.date_naive() - self.start.date_naive()).num_days() + 1).max(1)
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} .. {}",
            self.start.format("%Y-%m-%d %H:%M"),
            self.end.format("%Y-%m-%d %H:%M")
        )
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, mo: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_new_rejects_reversed_range() {
        assert!(DateRange::new(at(2026, 3, 2, 0), at(2026, 3, 1, 0)).is_err());
        assert!(DateRange::new(at(2026, 3, 2, 0), at(2026, 3, 2, 0)).is_ok());
    }

    #[test]
    fn test_contains_is_inclusive() {
        let range = DateRange::new(at(2026, 3, 2, 0), at(2026, 3, 3, 0)).unwrap();
        assert!(range.contains(at(2026, 3, 2, 0)));
        assert!(range.contains(at(2026, 3, 3, 0)));
        assert!(!range.contains(at(2026, 3, 3, 1)));
    }

    #[test]
    fn test_today_preset() {
        let range = DateRange::preset(DateRangePreset::Today, at(2026, 3, 4, 13));
        assert_eq!(range.start, at(2026, 3, 4, 0));
        assert!(range.contains(at(2026, 3, 4, 23)));
        assert!(!range.contains(at(2026, 3, 5, 0)));
        assert_eq!(range.days(), 1);
    }

    #[test]
    fn test_week_preset_starts_monday() {
        // 2026-03-04 is a Wednesday
        let range = DateRange::preset(DateRangePreset::ThisWeek, at(2026, 3, 4, 13));
        assert_eq!(range.start, at(2026, 3, 2, 0));
        assert_eq!(range.days(), 7);
        assert!(range.contains(at(2026, 3, 8, 23)));
    }

    #[test]
    fn test_month_preset_handles_december() {
        let range = DateRange::preset(DateRangePreset::ThisMonth, at(2026, 12, 15, 9));
        assert_eq!(range.start, at(2026, 12, 1, 0));
        assert_eq!(range.days(), 31);

        let feb = DateRange::preset(DateRangePreset::ThisMonth, at(2026, 2, 10, 9));
        assert_eq!(feb.days(), 28);
    }

    #[test]
    fn test_preset_parsing() {
        assert_eq!("this-week".parse::<DateRangePreset>().unwrap(), DateRangePreset::ThisWeek);
        assert_eq!("Today".parse::<DateRangePreset>().unwrap(), DateRangePreset::Today);
        assert!("fortnight".parse::<DateRangePreset>().is_err());
    }
}
