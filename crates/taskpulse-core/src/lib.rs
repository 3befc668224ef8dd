//! # Taskpulse Core Library
//!
//! Estimation and analytics engine for a task-tracking application. The
//! surrounding application owns tasks and time entries; this library turns
//! snapshots of them into numbers.
//!
//! ## Architecture
//!
//! Every operation is synchronous and pure over caller-supplied collections.
//! Nothing is cached, so callers recompute after mutating their data.
//! Missing samples are reported as `None`, never as zero, and degenerate
//! numeric input (zero rates, zero crews, empty intervals) is absorbed by
//! documented floor and skip policies instead of errors.
//!
//! ## Key Components
//!
//! - [`WorkHoursCalculator`]: working hours inside a daily window, crew sizing
//! - [`ProductivityRateModel`]: expected/historical/custom rate reconciliation
//! - [`TaskTypeAnalyzer`]: historical overrun and productivity per task type
//! - [`TaskEstimator`]: duration / effort / quantity estimation solver
//! - [`KpiManager`]: efficiency, accuracy, utilization and health score
//! - [`EngineConfig`]: TOML configuration of all tunable constants

pub mod analytics;
pub mod config;
pub mod dataset;
pub mod error;
pub mod estimator;
pub mod kpi;
pub mod productivity;
pub mod task;
pub mod work_hours;

pub use analytics::{TaskTypeAnalytics, TaskTypeAnalyzer};
pub use config::{ContributorProxy, EngineConfig, KpiConfig, WorkdayConfig};
pub use dataset::Dataset;
pub use error::{ConfigError, CoreError, Result, ValidationError};
pub use estimator::{Derivation, EstimationMode, QuantityCalculationMode, TaskEstimator};
pub use kpi::{
    compare_kpis, DateRange, DateRangePreset, HealthStatus, KpiManager, KpiResult, KpiSnapshot,
    KpiTrend, ScalarMetrics,
};
pub use productivity::{ProductivityMode, ProductivityRateModel, RateVariance};
pub use task::{Task, TaskId, TaskIndex, TimeEntry, TimeEntryId};
pub use work_hours::{CrewPlan, Scenario, ScenarioStatus, WorkHoursCalculator};
