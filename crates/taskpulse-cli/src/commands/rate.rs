use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};
use serde::Serialize;
use taskpulse_core::{
    Dataset, ProductivityMode, ProductivityRateModel, RateVariance, TaskTypeAnalyzer,
};

use super::{load_config, print_json, CliResult};

#[derive(Clone, Copy, ValueEnum)]
enum RateSource {
    Expected,
    Historical,
    Custom,
}

impl From<RateSource> for ProductivityMode {
    fn from(source: RateSource) -> Self {
        match source {
            RateSource::Expected => ProductivityMode::Expected,
            RateSource::Historical => ProductivityMode::Historical,
            RateSource::Custom => ProductivityMode::Custom,
        }
    }
}

#[derive(Args)]
pub struct RateArgs {
    /// Expected units per person-hour
    #[arg(long)]
    expected: Option<f64>,
    /// Historical units per person-hour
    #[arg(long, conflicts_with = "data")]
    historical: Option<f64>,
    /// Custom rate as typed by the user
    #[arg(long)]
    custom: Option<String>,
    /// Take the historical rate from this dataset
    #[arg(long, requires = "task_type")]
    data: Option<PathBuf>,
    /// Task type whose history supplies the historical rate
    #[arg(long = "type")]
    task_type: Option<String>,
    /// Active rate source (defaults to custom when --custom is given)
    #[arg(long, value_enum)]
    mode: Option<RateSource>,
    /// Unit label
    #[arg(long, default_value = "units")]
    unit: String,
}

#[derive(Serialize)]
struct RateOutput {
    mode: ProductivityMode,
    rate: f64,
    formatted: String,
    variance: Option<RateVariance>,
    significant_variance: bool,
    message: Option<String>,
}

pub fn run(args: RateArgs, config_path: Option<&Path>) -> CliResult {
    let config = load_config(config_path)?;
    let mut model = ProductivityRateModel::from_config(&config);
    model.expected_productivity = args.expected;
    model.historical_productivity = args.historical;

    if let (Some(data), Some(task_type)) = (&args.data, &args.task_type) {
        let dataset = Dataset::from_json_file(data)?;
        let analytics = TaskTypeAnalyzer::from_config(&config).calculate(
            task_type,
            &dataset.tasks,
            &dataset.time_entries,
        );
        model.load_historical(analytics.as_ref());
    }
    if let Some(custom) = &args.custom {
        model.set_custom_rate(custom);
    }
    if let Some(mode) = args.mode {
        model.select_mode(mode.into());
    }

    let rate = model.validate(&args.unit)?;
    print_json(&RateOutput {
        mode: model.productivity_mode,
        rate,
        formatted: model.formatted_rate(&args.unit),
        variance: model.calculate_variance(),
        significant_variance: model.has_significant_variance(),
        message: model.variance_message(),
    })
}
