//! filever - content-hash asset revisioning and reference rewriting.

mod asset;
mod cli;
mod config;
mod logger;
mod rewrite;
mod utils;

use anyhow::{Context, Result, bail};
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::FileverConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let cwd = std::env::current_dir().context("Failed to get current working directory")?;
    let config = FileverConfig::load(&cwd, &cli.config)?;

    match &cli.command {
        Commands::Check => {
            let missing = cli::check::check_tasks(&config)?;
            if missing > 0 {
                bail!("{} missing", utils::plural_count(missing, "source"));
            }
            Ok(())
        }
        command => {
            let phases = command.phases().unwrap_or_default();
            let map = cli::run::run_tasks(&config, phases)?;
            if command.print_map() {
                println!("{}", cli::run::map_json(&map)?);
            }
            Ok(())
        }
    }
}
