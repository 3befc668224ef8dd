use std::path::{Path, PathBuf};

use clap::Subcommand;
use taskpulse_core::EngineConfig;

use super::{load_config, print_json, CliResult};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Dot-separated key (e.g. "workday.start_hour", "kpi.weights.accuracy")
        key: String,
    },
    /// Set a config value
    Set {
        /// Dot-separated key
        key: String,
        /// New value
        value: String,
    },
    /// List all config values
    List,
    /// Reset config to defaults
    Reset,
    /// Print the config file location
    Path,
}

fn target_path(path: Option<&Path>) -> Result<PathBuf, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(path.to_path_buf()),
        None => Ok(EngineConfig::default_path()?),
    }
}

pub fn run(action: ConfigAction, path: Option<&Path>) -> CliResult {
    match action {
        ConfigAction::Get { key } => {
            let config = load_config(path)?;
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown key: {key}").into()),
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = match path {
                Some(p) if !p.exists() => EngineConfig::default(),
                _ => load_config(path)?,
            };
            config.set(&key, &value)?;
            config.save_to(&target_path(path)?)?;
            println!("ok");
        }
        ConfigAction::List => {
            print_json(&load_config(path)?)?;
        }
        ConfigAction::Reset => {
            EngineConfig::default().save_to(&target_path(path)?)?;
            println!("config reset to defaults");
        }
        ConfigAction::Path => {
            println!("{}", target_path(path)?.display());
        }
    }
    Ok(())
}
