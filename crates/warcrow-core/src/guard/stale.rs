use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info, warn};

use super::signatures::{CacheHealthSnapshot, SignatureTable};
use crate::cache::CachedData;
use crate::models::UnitEntry;
use crate::platform::{CacheStorage, Reloader, ServiceWorkerRegistry};
use crate::storage::{KeyClass, StorageKey};
use crate::store::CompanionStore;

/// Delay before the reload so the "reloading" notice can render.
const DEFAULT_RELOAD_DELAY: Duration = Duration::from_millis(500);

/// Cached unit values as they appear in local storage.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredUnits {
    Stamped(CachedData<Vec<UnitEntry>>),
    Plain(Vec<UnitEntry>),
}

/// What a soft refresh removed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RefreshReport {
    pub invalidated_queries: usize,
    pub removed_keys: Vec<String>,
    pub failed_keys: Vec<String>,
}

/// What a nuclear reset managed to do. Failures are descriptions of the
/// sub-steps that errored; they never stop the remaining steps.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ResetReport {
    pub unregistered_workers: usize,
    pub deleted_caches: usize,
    pub local_cleared: bool,
    pub session_cleared: bool,
    pub failures: Vec<String>,
    pub reload_scheduled: bool,
}

impl ResetReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Detects cached unit data known to be wrong and cleans it up.
pub struct StaleDataGuard {
    store: CompanionStore,
    signatures: SignatureTable,
    workers: Arc<dyn ServiceWorkerRegistry>,
    caches: Arc<dyn CacheStorage>,
    reloader: Arc<dyn Reloader>,
    reload_delay: Duration,
}

impl StaleDataGuard {
    pub fn new(
        store: CompanionStore,
        workers: Arc<dyn ServiceWorkerRegistry>,
        caches: Arc<dyn CacheStorage>,
        reloader: Arc<dyn Reloader>,
    ) -> Self {
        Self {
            store,
            signatures: SignatureTable::known_regressions(),
            workers,
            caches,
            reloader,
            reload_delay: DEFAULT_RELOAD_DELAY,
        }
    }

    pub fn with_signatures(mut self, signatures: SignatureTable) -> Self {
        self.signatures = signatures;
        self
    }

    pub fn with_reload_delay(mut self, delay: Duration) -> Self {
        self.reload_delay = delay;
        self
    }

    pub fn store(&self) -> &CompanionStore {
        &self.store
    }

    pub fn signatures(&self) -> &SignatureTable {
        &self.signatures
    }

    // ===== Detection =====

    /// True when any cached unit matches a known-bad signature.
    pub fn check(&self, cached_units: &[UnitEntry]) -> bool {
        self.signatures.find_match(cached_units).is_some()
    }

    pub fn snapshot(&self, cached_units: &[UnitEntry]) -> CacheHealthSnapshot {
        let matched = self.signatures.find_match(cached_units);
        if let Some(unit) = matched {
            debug!(unit = %unit.id, points = unit.points_cost, "Stale unit data detected");
        }
        CacheHealthSnapshot {
            known_bad_signatures: self.signatures.clone(),
            detected: matched.is_some(),
            matched_unit: matched.map(|u| u.id.clone()),
        }
    }

    /// Units from the query cache and from catalog keys in local storage.
    pub fn cached_units(&self) -> Vec<UnitEntry> {
        let mut units = self.store.queries().cached_units();

        let keys = match self.store.local().keys() {
            Ok(keys) => keys,
            Err(e) => {
                warn!(error = %e, "Failed to list local storage for stale check");
                return units;
            }
        };

        for key in keys {
            if StorageKey::parse(&key).class() != KeyClass::Catalog {
                continue;
            }
            let contents = match self.store.local().get(&key) {
                Ok(Some(contents)) => contents,
                Ok(None) => continue,
                Err(e) => {
                    debug!(key = %key, error = %e, "Failed to read cached key");
                    continue;
                }
            };
            match serde_json::from_str::<StoredUnits>(&contents) {
                Ok(StoredUnits::Stamped(cached)) => units.extend(cached.data),
                Ok(StoredUnits::Plain(list)) => units.extend(list),
                Err(_) => debug!(key = %key, "Cached key does not hold units"),
            }
        }
        units
    }

    /// Run the check against everything currently cached.
    pub fn check_cached(&self) -> CacheHealthSnapshot {
        self.snapshot(&self.cached_units())
    }

    // ===== Remediation =====

    /// Drop cached catalog data, keeping authentication state.
    ///
    /// Safe to call repeatedly. Storage errors are logged per key.
    pub fn refresh(&self) -> RefreshReport {
        let mut report = RefreshReport {
            invalidated_queries: self.store.queries().invalidate_catalog(),
            ..Default::default()
        };

        match self.store.local().keys() {
            Ok(keys) => {
                for key in keys {
                    if !StorageKey::parse(&key).is_refreshable() {
                        continue;
                    }
                    match self.store.local().remove(&key) {
                        Ok(()) => report.removed_keys.push(key),
                        Err(e) => {
                            warn!(key = %key, error = %e, "Failed to remove cached key");
                            report.failed_keys.push(key);
                        }
                    }
                }
            }
            Err(e) => warn!(error = %e, "Failed to list local storage for refresh"),
        }

        info!(
            queries = report.invalidated_queries,
            removed = report.removed_keys.len(),
            failed = report.failed_keys.len(),
            "Cache refresh complete"
        );
        report
    }

    /// Wipe every piece of client state, then schedule a reload.
    ///
    /// Signs the user out. Callers must confirm with the user first. Each
    /// step runs even if an earlier one failed, and the reload is always
    /// scheduled exactly once.
    pub async fn nuclear_reset(&self) -> ResetReport {
        warn!("Nuclear reset requested");
        let mut report = ResetReport::default();

        match self.workers.registrations().await {
            Ok(scopes) => {
                for scope in scopes {
                    match self.workers.unregister(&scope).await {
                        Ok(true) => report.unregistered_workers += 1,
                        Ok(false) => debug!(scope = %scope, "Service worker already gone"),
                        Err(e) => {
                            warn!(scope = %scope, error = %e, "Failed to unregister service worker");
                            report.failures.push(format!("unregister {}: {}", scope, e));
                        }
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to list service workers");
                report.failures.push(format!("list service workers: {}", e));
            }
        }

        match self.caches.keys().await {
            Ok(names) => {
                for name in names {
                    match self.caches.delete(&name).await {
                        Ok(true) => report.deleted_caches += 1,
                        Ok(false) => debug!(cache = %name, "Cache already gone"),
                        Err(e) => {
                            warn!(cache = %name, error = %e, "Failed to delete cache");
                            report.failures.push(format!("delete cache {}: {}", name, e));
                        }
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to list caches");
                report.failures.push(format!("list caches: {}", e));
            }
        }

        match self.store.local().clear() {
            Ok(()) => report.local_cleared = true,
            Err(e) => {
                warn!(error = %e, "Failed to clear local storage");
                report.failures.push(format!("clear local storage: {}", e));
            }
        }

        match self.store.session().clear() {
            Ok(()) => report.session_cleared = true,
            Err(e) => {
                warn!(error = %e, "Failed to clear session storage");
                report.failures.push(format!("clear session storage: {}", e));
            }
        }

        self.store.queries().invalidate_where(|_| true);

        self.reloader.schedule_reload(self.reload_delay);
        report.reload_scheduled = true;

        info!(
            workers = report.unregistered_workers,
            caches = report.deleted_caches,
            failures = report.failures.len(),
            "Nuclear reset complete"
        );
        report
    }
}
