//! strata CLI
//!
//! Compares merged configuration across environments and reconciles
//! placeholder keys against a secret store.

use clap::Parser;
use std::process::ExitCode;
use strata_config::cli::{Cli, EXIT_ERROR};
use strata_config::logging::{self, LogTarget};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = logging::init(&LogTarget::parse(&cli.log), cli.verbose) {
        eprintln!("Error: failed to initialize logging: {:#}", err);
        return ExitCode::from(EXIT_ERROR);
    }

    ExitCode::from(cli.command.run().await)
}
