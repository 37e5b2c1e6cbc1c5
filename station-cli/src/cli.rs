use anyhow::Context;
use clap::{Parser, Subcommand};
use std::{
    path::{Path, PathBuf},
    rc::Rc,
};
use tracing::Level;

use station_core::{FailurePolicy, Reading, StationConfig, TracingSink};

use crate::demo::{self, Summary};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-station", version, about = "Weather station observer demo")]
pub struct Cli {
    /// Log at debug level regardless of the configured level.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file to use instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Register both displays, replay the configured readings, then remove one display.
    Demo {
        /// Print the final state as JSON.
        #[arg(long)]
        json: bool,

        /// Override the failure policy, e.g. "isolate" or "fail-fast".
        #[arg(long)]
        policy: Option<String>,
    },

    /// Publish a single reading to both displays.
    #[command(allow_negative_numbers = true)]
    Record {
        /// Degrees Celsius.
        temperature: f64,

        /// Relative humidity in percent.
        humidity: f64,

        /// Hectopascal; standard sea-level pressure if absent.
        #[arg(long)]
        pressure: Option<f64>,

        #[arg(long)]
        json: bool,
    },

    /// Inspect or create the configuration file.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print where the configuration is read from.
    Path,
    /// Print the effective configuration as TOML.
    Show,
    /// Write the default configuration.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        let Cli { verbose, config: config_override, command } = self;

        // Path and init must work even when the existing file does not parse.
        if let Command::Config { action: action @ (ConfigAction::Path | ConfigAction::Init { .. }) } =
            &command
        {
            return run_config_file_action(action, config_override.as_deref());
        }

        let config = load_config(config_override.as_deref())?;
        let level = if verbose { Level::DEBUG } else { config.tracing_level()? };
        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();

        match command {
            Command::Demo { json, policy } => {
                let policy = match policy {
                    Some(name) => FailurePolicy::try_from(name.as_str())?,
                    None => config.failure_policy,
                };

                if !json {
                    println!("{}", "=".repeat(60));
                    println!("Observer pattern demonstration");
                    println!("{}", "=".repeat(60));
                }

                let summary = demo::run_demo(&config, policy, Rc::new(TracingSink))?;
                print_summary(&summary, json)?;
            }
            Command::Record { temperature, humidity, pressure, json } => {
                let reading = Reading::new(temperature, humidity, pressure);
                let summary =
                    demo::record_once(reading, config.failure_policy, Rc::new(TracingSink))?;
                print_summary(&summary, json)?;
            }
            Command::Config { action: ConfigAction::Show } => print!("{}", config.to_toml()?),
            Command::Config { action } => {
                run_config_file_action(&action, config_override.as_deref())?
            }
        }

        Ok(())
    }
}

fn run_config_file_action(action: &ConfigAction, explicit: Option<&Path>) -> anyhow::Result<()> {
    let path = config_path(explicit)?;

    match action {
        ConfigAction::Init { force } => {
            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists: {}\nHint: pass --force to overwrite it.",
                    path.display()
                );
            }
            StationConfig::default().save_to(&path)?;
            println!("Wrote default configuration to {}", path.display());
        }
        _ => println!("{}", path.display()),
    }

    Ok(())
}

fn config_path(explicit: Option<&Path>) -> anyhow::Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => StationConfig::config_file_path(),
    }
}

fn load_config(explicit: Option<&Path>) -> anyhow::Result<StationConfig> {
    match explicit {
        Some(path) if path.exists() => StationConfig::load_from(path),
        Some(_) => Ok(StationConfig::default()),
        None => StationConfig::load(),
    }
}

fn print_summary(summary: &Summary, json: bool) -> anyhow::Result<()> {
    if json {
        let out = serde_json::to_string_pretty(summary).context("Failed to serialize summary")?;
        println!("{out}");
    } else {
        println!("{summary}");
    }
    Ok(())
}
