//! sampled — periodic statistics sample set daemon.
//!
//! Run with:  `RUST_LOG=info sampled [path/to/sampled.toml]`

mod daemon;

use anyhow::Result;
use daemon::Daemon;
use sampled_config::{default_path, ConfigWatcher};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Structured logging — RUST_LOG controls verbosity (default: info).
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("sampled v{} starting", env!("CARGO_PKG_VERSION"));

    let path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(default_path);
    let config = sampled_config::load(&path)?;

    let mut daemon = Daemon::new(config.global.clone());
    daemon.apply(config).await;
    info!(sample_sets = daemon.len(), "sample sets running");

    let (_watcher, mut reloads) = ConfigWatcher::spawn(&path);

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    warn!("cannot listen for shutdown signal: {e}");
                }
                break;
            }
            Some(()) = reloads.recv() => match sampled_config::load(&path) {
                Ok(cfg) => {
                    info!("Config reloaded");
                    daemon.apply(cfg).await;
                }
                Err(e) => warn!("Config reload failed: {e}"),
            },
        }
    }

    info!("shutting down");
    daemon.shutdown().await;
    Ok(())
}
