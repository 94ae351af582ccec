//! tcache entry point.
//!
//! Loads layered configuration, opens the response cache and runs one
//! command. Logging goes to stderr so command output on stdout stays clean.

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tcache_core::{AppConfig, HttpCache};
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(Some(path.as_path()))?,
        None => AppConfig::load()?,
    };

    let output = match cli.command {
        Command::Startup { overrides } => commands::run_startup(config.startup, &overrides).await?,
        Command::Cache(command) => {
            let cache = HttpCache::open(&config).await;
            commands::run_cache(&cache, command).await?
        }
        Command::Fingerprint { method, url, params } => commands::run_fingerprint(&method, &url, &params),
    };

    println!("{}", output.text);

    Ok(if output.success { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
