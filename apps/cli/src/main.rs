//! healthpull CLI — parameterized extraction pipelines for health-information
//! systems.
//!
//! Authenticates to a remote DHIS2- or IASO-style API, fetches org-unit or
//! aggregated-value data, reshapes it onto a fixed schema, and writes CSV
//! files into the workspace.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
