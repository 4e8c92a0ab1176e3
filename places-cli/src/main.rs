// SPDX-License-Identifier: GPL-3.0-only

//! places - aggregated view of disks, mounts and remote connections
//!
//! Lists the entries of the `devices:///` root, watches it for changes and
//! edits block device names and aliases.

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use places_core::{DeviceRegistry, ListOptions, RootWatcher};
use places_types::{AGGREGATION_ROOT, DeviceEntry, GhostSignal};
use tokio::sync::{mpsc, oneshot};
use tracing::info;

mod bootstrap;
mod config;
mod logging;
mod output;

use config::Config;

#[derive(Parser)]
#[command(name = "places")]
#[command(about = "Aggregated view of disks, mounts and remote connections", long_about = None)]
struct Cli {
    /// Config file (defaults to $XDG_CONFIG_HOME/places/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every entry of the aggregation root
    List {
        /// Stop after block devices
        #[arg(long)]
        block_only: bool,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print change notifications until interrupted
    Watch {
        /// Print one JSON object per notification
        #[arg(long)]
        json: bool,
    },
    /// Rename a block device (alias for internal disks, label otherwise)
    Rename {
        /// Entry identifier, e.g. devices:///sda1.localdisk
        identifier: String,
        name: String,
    },
    /// Set or clear the alias of an internal disk
    Alias {
        identifier: String,
        /// New alias; omit to clear
        alias: Option<String>,
    },
    /// Re-read one entry, including its sidecar disk info
    Reload {
        identifier: String,
        #[arg(long)]
        json: bool,
    },
    /// List UUIDs of system disks
    SystemDisks,
    /// Report a loop device removed behind the block storage manager's back
    GhostRemove {
        /// Device node, e.g. /dev/loop3
        path: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);
    let config = Config::load(&config_path)?;
    logging::init(&config);

    info!("Starting places v{}", env!("CARGO_PKG_VERSION"));

    run(cli.command, &config).await
}

async fn run(command: Commands, config: &Config) -> Result<()> {
    let backends = bootstrap::backends(config).await?;
    let context = bootstrap::context();

    match command {
        Commands::Watch { json } => {
            let (notifications, mut received) = mpsc::unbounded_channel();
            let mut watcher = RootWatcher::new(AGGREGATION_ROOT, backends, context, notifications);
            watcher.start().await?;

            let (shutdown, shutdown_requested) = oneshot::channel();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    let _ = shutdown.send(());
                }
            });

            let printer = tokio::spawn(async move {
                while let Some(notification) = received.recv().await {
                    if json {
                        match serde_json::to_string(&notification) {
                            Ok(line) => println!("{line}"),
                            Err(e) => eprintln!("places: cannot encode notification: {e}"),
                        }
                    } else {
                        println!("{}", output::notification_line(&notification));
                    }
                }
            });

            watcher.run(shutdown_requested).await?;
            drop(watcher);
            printer.await.context("notification printer")?;
        }
        Commands::GhostRemove { path } => {
            let (notifications, mut received) = mpsc::unbounded_channel();
            let watcher = RootWatcher::new(AGGREGATION_ROOT, backends, context, notifications);
            watcher.ghost_signal(GhostSignal::Removed, &path)?;
            drop(watcher);
            while let Some(notification) = received.recv().await {
                println!("{}", output::notification_line(&notification));
            }
        }
        Commands::List { block_only, json } => {
            let registry = DeviceRegistry::new(backends, context);
            let options = ListOptions {
                block_only,
                smb_integration: config.smb_integration,
            };
            let entries = registry.list_entries(AGGREGATION_ROOT, options).await;
            print_entries(&entries, json)?;
        }
        Commands::Rename { identifier, name } => {
            let registry = DeviceRegistry::new(backends, context);
            let entry = lookup(&registry, &identifier).await?;
            registry.rename(&entry, &name).await?;
            println!("renamed {identifier} to {name}");
        }
        Commands::Alias { identifier, alias } => {
            let registry = DeviceRegistry::new(backends, context);
            let entry = lookup(&registry, &identifier).await?;
            let change = registry.set_alias(&entry, alias.as_deref().unwrap_or_default())?;
            println!("{change:?}");
        }
        Commands::Reload { identifier, json } => {
            let registry = DeviceRegistry::new(backends, context);
            let entry = registry
                .reload(&identifier)
                .await
                .ok_or_else(|| anyhow!("unknown entry: {identifier}"))?;
            print_entries(&[entry], json)?;
        }
        Commands::SystemDisks => {
            let registry = DeviceRegistry::new(backends, context);
            for uuid in registry.system_disk_uuids().await {
                println!("{uuid}");
            }
        }
    }

    Ok(())
}

async fn lookup(registry: &DeviceRegistry, identifier: &str) -> Result<DeviceEntry> {
    registry
        .entry(identifier)
        .await
        .ok_or_else(|| anyhow!("unknown entry: {identifier}"))
}

fn print_entries(entries: &[DeviceEntry], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(entries)?);
    } else {
        for entry in entries {
            println!("{}", output::entry_line(entry));
        }
    }
    Ok(())
}
