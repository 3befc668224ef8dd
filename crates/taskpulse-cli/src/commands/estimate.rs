use std::path::{Path, PathBuf};

use clap::Subcommand;
use serde::Serialize;
use taskpulse_core::{
    Dataset, Derivation, EstimationMode, QuantityCalculationMode, TaskEstimator,
    TaskTypeAnalytics, TaskTypeAnalyzer,
};

use super::{load_config, print_json, CliResult};

#[derive(Subcommand)]
pub enum EstimateAction {
    /// Duration from effort and crew size
    Effort {
        /// Person-hours of work
        #[arg(long)]
        hours: f64,
        /// Crew size
        #[arg(long, default_value_t = 1)]
        personnel: u32,
    },
    /// Duration or crew size from quantity and productivity rate
    Quantity {
        /// Units of work
        #[arg(long)]
        quantity: f64,
        /// Units per person-hour
        #[arg(long)]
        rate: f64,
        /// Crew size; derives duration
        #[arg(long, conflicts_with = "duration")]
        personnel: Option<u32>,
        /// Target duration in hours; derives crew size
        #[arg(long)]
        duration: Option<f64>,
    },
    /// Estimate state for a stored task
    Task {
        /// Dataset file
        #[arg(long)]
        data: PathBuf,
        /// Task id or exact title
        #[arg(long)]
        task: String,
        /// Apply the task type's historical overrun when significant
        #[arg(long)]
        correct: bool,
    },
}

#[derive(Serialize)]
struct EstimateOutput {
    estimator: TaskEstimator,
    derivation: Option<Derivation>,
    total_effort_hours: Option<f64>,
    estimated_seconds: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    analytics: Option<TaskTypeAnalytics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    corrected: Option<bool>,
}

impl EstimateOutput {
    fn new(estimator: TaskEstimator, derivation: Option<Derivation>) -> Self {
        Self {
            total_effort_hours: estimator.total_effort_hours(),
            estimated_seconds: estimator.estimated_seconds(),
            estimator,
            derivation,
            analytics: None,
            corrected: None,
        }
    }
}

pub fn run(action: EstimateAction, config_path: Option<&Path>) -> CliResult {
    match action {
        EstimateAction::Effort { hours, personnel } => {
            let mut estimator = TaskEstimator::new(EstimationMode::Effort);
            estimator.set_effort_hours(hours);
            let derivation = estimator.set_personnel(personnel);
            print_json(&EstimateOutput::new(estimator, derivation))
        }
        EstimateAction::Quantity {
            quantity,
            rate,
            personnel,
            duration,
        } => {
            let mut estimator = TaskEstimator::new(EstimationMode::Quantity);
            estimator.set_quantity(quantity);
            estimator.set_productivity_rate(rate);
            let derivation = match duration {
                Some(duration) => {
                    estimator.set_quantity_mode(QuantityCalculationMode::CalculatePersonnel);
                    estimator.set_duration_hours(duration)
                }
                None => {
                    estimator.set_quantity_mode(QuantityCalculationMode::CalculateDuration);
                    estimator.set_personnel(personnel.unwrap_or(1))
                }
            };
            print_json(&EstimateOutput::new(estimator, derivation))
        }
        EstimateAction::Task {
            data,
            task,
            correct,
        } => {
            let config = load_config(config_path)?;
            let dataset = Dataset::from_json_file(&data)?;
            let stored = dataset
                .find_task(&task)
                .ok_or_else(|| format!("task not found: {task}"))?;
            let index = dataset.index();
            let mut estimator = TaskEstimator::for_task(stored, &index);

            let analytics = stored.task_type.as_deref().and_then(|task_type| {
                TaskTypeAnalyzer::from_config(&config).calculate_indexed(task_type, &dataset.tasks, &index)
            });
            let corrected = match (&analytics, correct) {
                (Some(analytics), true) => Some(estimator.apply_historical_correction(analytics)),
                _ => None,
            };

            let mut output = EstimateOutput::new(estimator, None);
            output.analytics = analytics;
            output.corrected = corrected;
            print_json(&output)
        }
    }
}
