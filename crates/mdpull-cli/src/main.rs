//! mdpull CLI - Fetch and cache remote markdown for static site builds
//!
//! This is the main entry point for the mdpull command-line interface.
//! Command implementations live in the `commands` module.

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
mod utils;

use cli::{Cli, Commands};
use commands::FetchOptions;
use utils::logging::initialize_logging;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    initialize_logging(&cli)?;

    execute_command(cli).await
}

async fn execute_command(cli: Cli) -> Result<()> {
    let load_config = || utils::config::load(cli.config.as_deref(), cli.cache_dir.as_deref());

    match cli.command {
        Commands::Fetch {
            urls,
            posts,
            concurrency,
            no_sweep,
            json,
        } => {
            let options = FetchOptions {
                urls,
                posts,
                concurrency: usize::from(concurrency),
                no_sweep,
                json,
                quiet: cli.quiet,
            };
            commands::fetch_documents(&load_config()?, options).await?;
        },

        Commands::Sweep => {
            commands::sweep_cache(&load_config()?)?;
        },

        Commands::Check { urls } => {
            commands::check_urls(&load_config()?, &urls).await?;
        },

        Commands::Scan { dir } => {
            commands::scan_posts(&dir, cli.quiet)?;
        },
    }

    Ok(())
}
