mod cli;
mod config;
mod error;
mod output;
mod providers;
mod snapshot;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    output::print_banner();

    info!("Starting wfwatch - Jenkins pipeline log crawler");
    cli.execute().await?;

    Ok(())
}
