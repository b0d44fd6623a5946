// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]

use anyhow::{Context, Result};
use clap::Parser;
use dgw_server::{config_loader, Server};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "dgw-server", version, about = "Drone-fleet natural-language control gateway")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "dgw.toml")]
    config: std::path::PathBuf,

    /// Enable verbose request/response debug logging.
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.debug {
        EnvFilter::new("dgw=debug,dgw_server=debug,dgw_executor=debug")
    } else {
        EnvFilter::new("dgw=info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = config_loader::load(&args.config)
        .with_context(|| format!("loading config from {}", args.config.display()))?;

    for warning in config.validate() {
        warn!(field = %warning.field, severity = ?warning.severity, "{}", warning.message);
    }

    let server = Arc::new(Server::new(config).context("building gateway server")?);
    info!("dgw-server ready, awaiting initialize over stdio");

    let monitoring_handle = tokio::spawn(server.clone().run_monitoring_loop());

    run_stdio_loop(server).await?;
    monitoring_handle.abort();
    Ok(())
}

/// One reader task consumes stdin and dispatches each line onto its own
/// worker task so that requests may execute concurrently (§5); responses are
/// written to stdout, in whatever order they complete, by a single writer
/// task reading off `tx` so that concurrent writes never interleave.
async fn run_stdio_loop(server: Arc<Server>) -> Result<()> {
    let stdin = tokio::io::stdin();
    let mut lines = BufReader::new(stdin).lines();
    let idle_timeout = Duration::from_secs(u64::from(server.idle_timeout_s()));

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(response) = rx.recv().await {
            if let Err(err) = stdout.write_all(response.as_bytes()).await {
                error!(error = %err, "error writing response");
                break;
            }
            if let Err(err) = stdout.flush().await {
                error!(error = %err, "error flushing stdout");
                break;
            }
        }
    });

    let mut workers = JoinSet::new();

    loop {
        if server.is_closed() {
            break;
        }

        let next_line = match tokio::time::timeout(idle_timeout, lines.next_line()).await {
            Ok(Ok(Some(line))) => line,
            Ok(Ok(None)) => {
                info!("stdin closed, shutting down");
                break;
            }
            Ok(Err(err)) => {
                error!(error = %err, "error reading stdin");
                break;
            }
            Err(_) => {
                warn!("idle timeout elapsed, shutting down");
                break;
            }
        };

        if next_line.trim().is_empty() {
            continue;
        }

        let server = server.clone();
        let tx = tx.clone();
        workers.spawn(async move {
            if let Some(response) = server.handle_line(&next_line).await {
                let _ = tx.send(response);
            }
        });

        // Reap finished workers as they complete so the set doesn't grow
        // without bound across a long-lived connection; never blocks on a
        // still-running one.
        while workers.try_join_next().is_some() {}
    }

    drop(tx);
    while workers.join_next().await.is_some() {}
    writer.await.context("response writer task panicked")?;

    Ok(())
}
