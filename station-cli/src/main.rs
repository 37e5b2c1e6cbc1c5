//! Binary crate for the `weather-station` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Logging setup
//! - Running the observer demonstration and printing its outcome

use clap::Parser;

mod cli;
mod demo;

fn main() -> anyhow::Result<()> {
    let cmd = cli::Cli::parse();
    cmd.run()
}
