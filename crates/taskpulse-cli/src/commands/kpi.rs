use std::path::{Path, PathBuf};

use chrono::Utc;
use clap::Args;
use taskpulse_core::{
    compare_kpis, Dataset, DateRange, DateRangePreset, KpiManager, KpiSnapshot, KpiTrend,
};
use tracing::info;

use super::{load_config, parse_time, print_json, CliResult};

#[derive(Args)]
pub struct KpiArgs {
    /// Dataset file (JSON with `tasks` and `time_entries`)
    #[arg(long)]
    data: PathBuf,
    /// Range preset: today, this-week, this-month
    #[arg(long, conflicts_with_all = ["from", "to"])]
    preset: Option<DateRangePreset>,
    /// Range start (RFC 3339)
    #[arg(long, requires = "to")]
    from: Option<String>,
    /// Range end (RFC 3339)
    #[arg(long, requires = "from")]
    to: Option<String>,
    /// Reference instant for presets (RFC 3339, defaults to now)
    #[arg(long)]
    now: Option<String>,
    /// Print a text report instead of JSON
    #[arg(long)]
    report: bool,
    /// Also write a snapshot of the result to this file
    #[arg(long)]
    snapshot: Option<PathBuf>,
}

fn resolve_range(args: &KpiArgs) -> Result<DateRange, Box<dyn std::error::Error>> {
    if let (Some(from), Some(to)) = (&args.from, &args.to) {
        let start = parse_time(from)?.with_timezone(&Utc);
        let end = parse_time(to)?.with_timezone(&Utc);
        return Ok(DateRange::new(start, end)?);
    }
    let now = match &args.now {
        Some(now) => parse_time(now)?.with_timezone(&Utc),
        None => Utc::now(),
    };
    Ok(DateRange::preset(args.preset.unwrap_or(DateRangePreset::ThisWeek), now))
}

pub fn run(args: KpiArgs, config_path: Option<&Path>) -> CliResult {
    let config = load_config(config_path)?;
    let dataset = Dataset::from_json_file(&args.data)?;
    let range = resolve_range(&args)?;

    let manager = KpiManager::from_config(&config);
    let result = manager.calculate(&dataset.tasks, &dataset.time_entries, &range);

    if let Some(path) = &args.snapshot {
        let snapshot = manager.create_snapshot(&result);
        std::fs::write(path, serde_json::to_string_pretty(&snapshot)?)?;
        info!(path = %path.display(), "wrote KPI snapshot");
    }

    if args.report {
        print!("{}", result.render_report());
        Ok(())
    } else {
        print_json(&result)
    }
}

fn read_snapshot(path: &Path) -> Result<KpiSnapshot, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read snapshot {}: {e}", path.display()))?;
    Ok(serde_json::from_str(&content)?)
}

pub fn compare(current: &Path, previous: &Path) -> CliResult {
    let current = read_snapshot(current)?;
    let previous = read_snapshot(previous)?;
    print_json(&compare_kpis(&current, &previous))
}

pub fn trend(history: &Path) -> CliResult {
    let content = std::fs::read_to_string(history)
        .map_err(|e| format!("cannot read history {}: {e}", history.display()))?;
    let snapshots: Vec<KpiSnapshot> = serde_json::from_str(&content)?;
    match KpiTrend::from_history(&snapshots) {
        Some(trend) => print_json(&trend),
        None => Err("snapshot history is empty".into()),
    }
}
