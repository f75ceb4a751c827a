//! Command line entry point of the sakila star-schema replicator.
//!
//! Loads the configuration, initializes logging and runs one command on a current-thread
//! runtime. Exits with a non-zero status when the command fails or validation finds
//! inconsistencies.

use std::process::ExitCode;

use clap::Parser;
use etl_config::Environment;
use etl_telemetry::tracing::init_tracing;
use tracing::error;

use crate::cli::{Cli, Command};
use crate::config::load_replicator_config;
use crate::core::run_command;
use crate::error::{ReplicatorError, ReplicatorResult};

mod cli;
mod config;
mod core;
mod error;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            eprint!("{}", err.render_report());

            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> ReplicatorResult<()> {
    let replicator_config = load_replicator_config()?;

    let environment = Environment::load()?;
    init_tracing(env!("CARGO_BIN_NAME"), environment).map_err(ReplicatorError::config)?;

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(run_command(command, replicator_config))
}
