//! Data version marker comparison.
//!
//! The data service publishes a small version marker that changes whenever
//! the unit catalog does. Comparing it with the marker cached alongside the
//! data catches every regression, not only the ones in the signature table.

use anyhow::{Context, Result};
use futures::future::BoxFuture;
use tracing::{debug, info};

use crate::models::DataVersion;
use crate::store::CompanionStore;

/// Local storage key of the cached marker. Lives in the application
/// namespace, so a soft refresh drops it together with the data it describes.
pub const DATA_VERSION_KEY: &str = "warcrow_data_version";

/// Where the current marker comes from.
pub trait VersionSource: Send + Sync {
    fn fetch_data_version(&self) -> BoxFuture<'_, Result<DataVersion>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionStatus {
    /// Cached data matches the server.
    Fresh(DataVersion),
    /// Cached data was fetched for an older version.
    Stale {
        cached: DataVersion,
        current: DataVersion,
    },
    /// Nothing cached to compare with; the current marker is now remembered.
    Unknown(DataVersion),
}

impl VersionStatus {
    pub fn is_stale(&self) -> bool {
        matches!(self, VersionStatus::Stale { .. })
    }
}

pub struct VersionGuard {
    store: CompanionStore,
}

impl VersionGuard {
    pub fn new(store: CompanionStore) -> Self {
        Self { store }
    }

    pub fn cached(&self) -> Result<Option<DataVersion>> {
        let Some(contents) = self.store.local().get(DATA_VERSION_KEY)? else {
            return Ok(None);
        };
        match serde_json::from_str(&contents) {
            Ok(version) => Ok(Some(version)),
            Err(e) => {
                debug!(error = %e, "Ignoring unreadable cached data version");
                Ok(None)
            }
        }
    }

    pub fn remember(&self, version: &DataVersion) -> Result<()> {
        let contents = serde_json::to_string(version)?;
        self.store
            .local()
            .set(DATA_VERSION_KEY, &contents)
            .context("Failed to store data version")?;
        Ok(())
    }

    /// Fetch the current marker and compare it with the cached one.
    pub async fn check(&self, source: &dyn VersionSource) -> Result<VersionStatus> {
        let current = source
            .fetch_data_version()
            .await
            .context("Failed to fetch data version")?;

        let status = match self.cached()? {
            Some(cached) if cached.same_data(&current) => VersionStatus::Fresh(current),
            Some(cached) => {
                info!(cached = %cached.version, current = %current.version, "Cached data is out of date");
                VersionStatus::Stale { cached, current }
            }
            None => {
                self.remember(&current)?;
                VersionStatus::Unknown(current)
            }
        };
        Ok(status)
    }
}
