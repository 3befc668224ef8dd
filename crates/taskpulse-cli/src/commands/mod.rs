pub mod analytics;
pub mod config;
pub mod estimate;
pub mod hours;
pub mod kpi;
pub mod rate;

use std::path::Path;

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use taskpulse_core::EngineConfig;

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Config from `--config`, or the per-user file.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(EngineConfig::load_from(path)?),
        None => Ok(EngineConfig::load_or_default()),
    }
}

/// Parse an RFC 3339 timestamp, keeping its offset.
pub fn parse_time(value: &str) -> Result<DateTime<FixedOffset>, Box<dyn std::error::Error>> {
    DateTime::parse_from_rfc3339(value)
        .map_err(|e| format!("invalid timestamp '{value}': {e}").into())
}

pub fn print_json<T: Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
