//! Coffer CLI - run the currency stub and safe contracts locally.

pub mod commands;
pub mod config;
pub mod demo;
pub mod output;
pub mod telemetry;

use clap::Parser;

use crate::commands::Cli;
use crate::config::CliConfig;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        output::print_error(&format!("Error: {:#}", e));
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = CliConfig::load(cli.config.as_deref())?;
    if let Some(state) = cli.state {
        config.state_dir = state;
    }

    let log_level = if cli.verbose { "debug" } else { config.log_level.as_str() };
    telemetry::init_telemetry(log_level, cli.json_logs || config.json_logs)?;

    commands::execute(cli.command, &config)
}
