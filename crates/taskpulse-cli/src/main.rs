use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "taskpulse", version, about = "Taskpulse estimation and KPI CLI")]
struct Cli {
    /// Engine config file (defaults to ~/.config/taskpulse/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// KPI report for a date range
    Kpi(commands::kpi::KpiArgs),
    /// Compare two saved KPI snapshots
    Compare {
        /// Current snapshot (JSON)
        current: PathBuf,
        /// Previous snapshot (JSON)
        previous: PathBuf,
    },
    /// Trend of a snapshot history file (JSON array)
    Trend {
        history: PathBuf,
    },
    /// Available work hours and crew scenarios
    Hours(commands::hours::HoursArgs),
    /// Estimate duration or crew size
    Estimate {
        #[command(subcommand)]
        action: commands::estimate::EstimateAction,
    },
    /// Task-type analytics from history
    Analytics(commands::analytics::AnalyticsArgs),
    /// Reconcile expected, historical and custom productivity rates
    Rate(commands::rate::RateArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.as_deref();
    let result = match cli.command {
        Commands::Kpi(args) => commands::kpi::run(args, config_path),
        Commands::Compare { current, previous } => commands::kpi::compare(&current, &previous),
        Commands::Trend { history } => commands::kpi::trend(&history),
        Commands::Hours(args) => commands::hours::run(args, config_path),
        Commands::Estimate { action } => commands::estimate::run(action, config_path),
        Commands::Analytics(args) => commands::analytics::run(args, config_path),
        Commands::Rate(args) => commands::rate::run(args, config_path),
        Commands::Config { action } => commands::config::run(action, config_path),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
