use std::path::Path;

use clap::Args;
use serde::Serialize;
use taskpulse_core::WorkHoursCalculator;

use super::{load_config, parse_time, print_json, CliResult};

#[derive(Args)]
pub struct HoursArgs {
    /// Window start (RFC 3339; the offset selects the local calendar)
    #[arg(long)]
    from: String,
    /// Window end (RFC 3339)
    #[arg(long)]
    to: String,
    /// Total effort in person-hours; adds crew scenarios to the output
    #[arg(long)]
    effort: Option<f64>,
}

#[derive(Serialize)]
struct AvailableHours {
    workday_hours: f64,
    available_hours: f64,
}

pub fn run(args: HoursArgs, config_path: Option<&Path>) -> CliResult {
    let config = load_config(config_path)?;
    let calculator = WorkHoursCalculator::with_config(&config.workday);
    let from = parse_time(&args.from)?;
    let to = parse_time(&args.to)?;

    match args.effort {
        Some(effort) => print_json(&calculator.plan_crew(effort, &from, &to)),
        None => print_json(&AvailableHours {
            workday_hours: calculator.workday_hours(),
            available_hours: calculator.calculate_available_hours(&from, &to),
        }),
    }
}
