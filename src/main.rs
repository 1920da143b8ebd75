//! pushcache
//!
//! Loads descriptors, opens the transports and push channels they name and
//! keeps pushed resources cached until told to stop.
//!
//! ```text
//!   settings.toml ─┐
//!   CLI sources  ──┼─▶ Configuration ──▶ routes (origin → transport)
//!                  │        │
//!                  │        └──▶ PushChannel ──▶ TransportRegistry ══▶ h2 over ws/tcp
//!                  │                 │
//!                  │                 └──▶ PushPromiseHandler ──▶ Cache
//!                  │
//!   file change  ──┴─▶ ConfigWatcher ──▶ backoff update + new sources
//! ```

use std::collections::HashSet;
use std::path::PathBuf;
use clap::Parser;
use tokio::sync::{broadcast, mpsc};

use pushcache::config::{load_config, ConfigWatcher, RuntimeConfig};
use pushcache::lifecycle::signals::wait_for_shutdown_signal;
use pushcache::observability::{logging, metrics};
use pushcache::{ConfigEvent, ConfigSource, Configuration};

#[derive(Parser)]
#[command(name = "pushcache")]
#[command(about = "Keeps HTTP/2 push channels open and caches what they push", long_about = None)]
struct Cli {
    /// Settings file (TOML). Watched for changes.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose transport and channel logging.
    #[arg(short, long)]
    debug: bool,

    /// Descriptor URLs to fetch, in addition to the settings file sources.
    sources: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut settings = match &cli.config {
        Some(path) => load_config(path)?,
        None => RuntimeConfig::default(),
    };
    settings.debug |= cli.debug;

    logging::init(&settings.observability.log_level, settings.debug);
    tracing::info!("pushcache v{} starting", env!("CARGO_PKG_VERSION"));

    if settings.observability.metrics_enabled {
        if let Ok(addr) = settings.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %settings.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let configuration = Configuration::builder().runtime(&settings).build();
    let mut events = configuration.subscribe();

    let mut known: HashSet<String> = HashSet::new();
    let mut sources: Vec<ConfigSource> = settings
        .descriptors
        .iter()
        .cloned()
        .map(ConfigSource::from)
        .collect();
    for url in settings.sources.iter().chain(cli.sources.iter()) {
        if known.insert(url.clone()) {
            sources.push(ConfigSource::from(url.as_str()));
        }
    }

    tracing::info!(sources = sources.len(), "Configuring");
    configuration.configure(sources)?;

    let (_watcher, mut updates) = match &cli.config {
        Some(path) => {
            let (watcher, rx) = ConfigWatcher::new(path, settings.clone());
            (Some(watcher.run()?), rx)
        }
        None => {
            let (_, rx) = mpsc::unbounded_channel();
            (None, rx)
        }
    };

    let shutdown = wait_for_shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(ConfigEvent::Completed) => {
                    tracing::info!(routes = ?configuration.routes().origins(), "Configuration complete");
                }
                Ok(ConfigEvent::Failed { source, reason }) => {
                    tracing::warn!(%source, %reason, "Configuration source failed");
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Configuration events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            Some(update) = updates.recv() => {
                if let Some(push) = update.push {
                    configuration.update_settings(push);
                }
                let fresh: Vec<ConfigSource> = update
                    .descriptors
                    .into_iter()
                    .map(ConfigSource::from)
                    .chain(
                        update
                            .sources
                            .iter()
                            .filter(|url| known.insert((*url).clone()))
                            .map(|url| ConfigSource::from(url.as_str())),
                    )
                    .collect();
                if !fresh.is_empty() {
                    tracing::info!(sources = fresh.len(), "Configuring new sources");
                    configuration.configure(fresh)?;
                }
            }
            _ = &mut shutdown => break,
        }
    }

    configuration.shutdown();
    tracing::info!("Shutdown complete");
    Ok(())
}
