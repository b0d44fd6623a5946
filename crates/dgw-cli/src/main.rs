// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dgw_cli::commands;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "dgw", version, about = "Drone-fleet gateway operator CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging.
    #[arg(long)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a gateway config file, exiting non-zero on any fatal issue.
    Validate {
        #[arg(long, default_value = "dgw.toml")]
        config: PathBuf,
    },

    /// Dry-run the NLP engine against one line of text.
    Parse {
        #[arg(long, default_value = "dgw.toml")]
        config: PathBuf,

        /// Text to parse.
        #[arg(long)]
        text: String,
    },

    /// Probe the configured backend with a single GET /drones call.
    Health {
        #[arg(long, default_value = "dgw.toml")]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.debug { EnvFilter::new("dgw=debug") } else { EnvFilter::new("dgw=info") };
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    match cli.command {
        Commands::Validate { config } => cmd_validate(&config),
        Commands::Parse { config, text } => cmd_parse(&config, &text),
        Commands::Health { config } => {
            let runtime = tokio::runtime::Runtime::new().context("building tokio runtime")?;
            runtime.block_on(cmd_health(&config))
        }
    }
}

fn cmd_validate(config_path: &std::path::Path) -> Result<()> {
    match commands::validate(config_path) {
        Ok(lines) => {
            for line in &lines {
                println!("{line}");
            }
            println!("configuration is valid");
            Ok(())
        }
        Err(err) => {
            eprintln!("{err:#}");
            std::process::exit(1);
        }
    }
}

fn cmd_parse(config_path: &std::path::Path, text: &str) -> Result<()> {
    let config = dgw_server::config_loader::load(config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;
    let intents = commands::parse(&config, text)?;
    println!("{}", serde_json::to_string_pretty(&intents)?);
    Ok(())
}

async fn cmd_health(config_path: &std::path::Path) -> Result<()> {
    let config = dgw_server::config_loader::load(config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;
    let report = commands::health(&config).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    if report["reachable"] == false {
        std::process::exit(1);
    }
    Ok(())
}
