//! Command-line parsing and command execution.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing::{info, warn};

use warcrow_core::catalog::{canonical_faction_id, dedupe_units};
use warcrow_core::guard::{StaleWatcher, VersionGuard, VersionStatus};
use warcrow_core::share::{self, SharedListView, SHARED_LIST_ROUTE};
use warcrow_core::{ArmyList, UnitEntry};

use crate::host::Host;
use crate::render::{render_list, render_snapshot};

/// Phrase the user must type to confirm a reset.
const RESET_CONFIRMATION: &str = "RESET";

#[derive(Parser, Debug)]
#[command(name = "warcrow")]
#[command(version, about = "Warcrow army list sharing and cache maintenance", long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print a share link for an army list
    Share {
        /// Army list JSON file
        path: PathBuf,
    },
    /// Show a shared army list
    Open {
        /// Share token or full share URL
        target: String,
    },
    /// Cache a unit catalog snapshot
    Import {
        /// JSON array of units
        path: PathBuf,
    },
    /// Check cached unit data for known bad values
    Check,
    /// Drop cached unit, army and faction data
    Refresh,
    /// Wipe all local data, including your sign-in
    Reset {
        /// Skip the confirmation prompt
        #[arg(short = 'y', long = "yes")]
        confirmed: bool,
    },
    /// Keep checking cached data until interrupted
    Watch,
    /// Compare cached data with the data service
    Version,
    /// Show session and cache state
    Status,
}

/// Army list file as exported by the web builder; `id` and `createdAt` are
/// optional there.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListFile {
    #[serde(default)]
    id: Option<String>,
    name: String,
    faction: String,
    #[serde(default)]
    units: Vec<UnitEntry>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

impl ListFile {
    fn into_list(self) -> ArmyList {
        let mut list = ArmyList::new(
            self.id.unwrap_or_else(|| "local".to_string()),
            self.name,
            canonical_faction_id(&self.faction),
        );
        list.units = self.units;
        if let Some(created_at) = self.created_at {
            list.created_at = created_at;
        }
        list
    }
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}

pub async fn run(command: Command, host: &mut Host) -> Result<()> {
    match command {
        Command::Share { path } => share_list(host, &path),
        Command::Open { target } => open_list(&target),
        Command::Import { path } => import_units(host, &path),
        Command::Check => check(host),
        Command::Refresh => refresh(host),
        Command::Reset { confirmed } => reset(host, confirmed).await,
        Command::Watch => watch(host).await,
        Command::Version => version(host).await,
        Command::Status => status(host),
    }
}

fn share_list(host: &Host, path: &Path) -> Result<()> {
    let list = read_json::<ListFile>(path)?.into_list();
    let url = share::share_url(&host.config.share_base_url, &list).context("List cannot be shared")?;

    info!(units = list.units.len(), url_len = url.len(), "Share link created");
    println!("{}", render_list(&list));
    println!();
    println!("{}", url);
    Ok(())
}

fn open_list(target: &str) -> Result<()> {
    let view = if target.contains(SHARED_LIST_ROUTE) {
        share::resolve_shared_path(target)
    } else {
        match share::decode(target) {
            Ok(list) => SharedListView::List(list),
            Err(e) => {
                warn!(error = %e, "Invalid share token");
                SharedListView::Invalid
            }
        }
    };

    match view {
        SharedListView::List(list) => {
            println!("{}", render_list(&list));
            Ok(())
        }
        SharedListView::Invalid => bail!("This list link is invalid or has expired"),
    }
}

fn import_units(host: &Host, path: &Path) -> Result<()> {
    let units: Vec<UnitEntry> = read_json(path)?;
    let total = units.len();
    let units = dedupe_units(units);
    host.store.save_unit_cache(&units)?;
    println!(
        "Cached {} units ({} duplicates dropped)",
        units.len(),
        total - units.len()
    );
    Ok(())
}

fn check(host: &Host) -> Result<()> {
    let snapshot = host.guard.check_cached();
    println!("{}", render_snapshot(&snapshot));
    Ok(())
}

fn refresh(host: &Host) -> Result<()> {
    let report = host.guard.refresh();
    println!(
        "Refreshed: {} cached entries removed, {} queries invalidated",
        report.removed_keys.len(),
        report.invalidated_queries
    );
    if !report.failed_keys.is_empty() {
        println!("Could not remove: {}", report.failed_keys.join(", "));
    }
    Ok(())
}

fn confirm_reset() -> Result<bool> {
    print!(
        "This deletes all local data and signs you out. Type {} to continue: ",
        RESET_CONFIRMATION
    );
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim() == RESET_CONFIRMATION)
}

async fn reset(host: &mut Host, confirmed: bool) -> Result<()> {
    if !confirmed && !confirm_reset()? {
        println!("Reset cancelled");
        return Ok(());
    }

    let report = host.guard.nuclear_reset().await;
    for failure in &report.failures {
        println!("Warning: {}", failure);
    }
    println!("Reloading...");

    if let Some(signal) = host.take_reload_signal() {
        signal.wait().await;
    }
    println!("All local data cleared. Sign in again to continue.");
    Ok(())
}

async fn watch(host: &Host) -> Result<()> {
    let period = host.config.stale_check_interval();
    let (watcher, mut alerts) = StaleWatcher::spawn(host.guard.clone(), period);
    println!("Watching cached data every {}s (Ctrl-C to stop)", period.as_secs());

    loop {
        tokio::select! {
            alert = alerts.recv() => {
                let Some(alert) = alert else { break };
                println!(
                    "[{}] Outdated unit data detected ({}). Run `warcrow refresh`, or `warcrow reset` if that does not help.",
                    alert.detected_at.format("%H:%M:%S"),
                    alert.unit_id.as_deref().unwrap_or("unknown unit"),
                );
            }
            result = tokio::signal::ctrl_c() => {
                result.context("Failed to listen for Ctrl-C")?;
                break;
            }
        }
    }

    watcher.stop();
    Ok(())
}

async fn version(host: &Host) -> Result<()> {
    let guard = VersionGuard::new(host.store.clone());
    match guard.check(&host.api).await? {
        VersionStatus::Fresh(current) => println!("Cached data is current ({})", current.version),
        VersionStatus::Stale { cached, current } => println!(
            "Cached data is from {}, the data service has {}. Run `warcrow refresh`.",
            cached.version, current.version
        ),
        VersionStatus::Unknown(current) => {
            println!("No cached data version; recorded {}", current.version)
        }
    }
    Ok(())
}

fn status(host: &Host) -> Result<()> {
    match host.session.data.as_ref().filter(|d| !d.is_expired()) {
        Some(data) => println!(
            "Signed in as {} (token expires in {} min)",
            data.email.as_deref().unwrap_or(&data.user_id),
            data.minutes_until_expiry()
        ),
        None => println!("Not signed in"),
    }

    match host.store.load_unit_cache() {
        Ok(Some(cached)) => println!(
            "Unit cache: {} units, updated {}{}",
            cached.data.len(),
            cached.age_display(),
            if cached.is_stale() { " (stale)" } else { "" }
        ),
        Ok(None) => println!("Unit cache: empty"),
        Err(e) => println!("Unit cache: unreadable ({})", e),
    }

    let cached_version = VersionGuard::new(host.store.clone()).cached()?;
    println!(
        "Data version: {}",
        cached_version.map(|v| v.version).unwrap_or_else(|| "unknown".to_string())
    );
    Ok(())
}
