//! progscout CLI — program knowledge engine for ITMO master's programs.
//!
//! Ingests program pages and curriculum documents into local artifacts,
//! then answers questions over the page text and scores electives
//! against a learner profile.

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
