//! `pagerduty` command-line entry point.

mod commands;

use std::process::ExitCode;

use clap::Parser;
use pagerduty::PagerDutyError;
use pagerduty::cli_args::{Cli, Command};

async fn run(cli: Cli) -> Result<(), PagerDutyError> {
    let config = commands::load_config(&cli.global)?;
    match cli.command {
        Command::Validate => commands::run_validate(&config).await,
        Command::Get(args) => commands::run_get(&args, &config).await,
        Command::List(args) => commands::run_list(&args, &config).await,
        Command::Login(args) => commands::run_login(&args, &config),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("pagerduty: {e}");
            ExitCode::FAILURE
        }
    }
}
