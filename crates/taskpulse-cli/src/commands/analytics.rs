use std::path::{Path, PathBuf};

use clap::Args;
use serde::Serialize;
use taskpulse_core::{Dataset, TaskTypeAnalytics, TaskTypeAnalyzer};

use super::{load_config, print_json, CliResult};

#[derive(Args)]
pub struct AnalyticsArgs {
    /// Dataset file
    #[arg(long)]
    data: PathBuf,
    /// Only this task type
    #[arg(long = "type")]
    task_type: Option<String>,
}

#[derive(Serialize)]
struct AnalyticsRow {
    #[serde(flatten)]
    analytics: TaskTypeAnalytics,
    suggestion: String,
}

impl From<TaskTypeAnalytics> for AnalyticsRow {
    fn from(analytics: TaskTypeAnalytics) -> Self {
        Self {
            suggestion: analytics.correction_suggestion(),
            analytics,
        }
    }
}

pub fn run(args: AnalyticsArgs, config_path: Option<&Path>) -> CliResult {
    let config = load_config(config_path)?;
    let dataset = Dataset::from_json_file(&args.data)?;
    let analyzer = TaskTypeAnalyzer::from_config(&config);

    match args.task_type {
        Some(task_type) => {
            let analytics = analyzer
                .calculate(&task_type, &dataset.tasks, &dataset.time_entries)
                .ok_or_else(|| format!("no completed, estimated and tracked tasks of type '{task_type}'"))?;
            print_json(&AnalyticsRow::from(analytics))
        }
        None => {
            let rows: Vec<AnalyticsRow> = analyzer
                .calculate_all(&dataset.tasks, &dataset.time_entries)
                .into_iter()
                .map(AnalyticsRow::from)
                .collect();
            print_json(&rows)
        }
    }
}
