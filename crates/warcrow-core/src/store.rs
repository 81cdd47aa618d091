//! The application store: storage areas plus the in-memory query cache.
//!
//! Built once by the host and handed to every component that needs it.
//! Clones share the same underlying storage.

use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context, Result};

use crate::cache::{CachedData, QueryCache};
use crate::models::UnitEntry;
use crate::storage::{KeyValueStorage, MemoryStorage};

/// Persisted unit catalog snapshot.
pub const UNIT_CACHE_KEY: &str = "warcrow_unit_cache_v1";

#[derive(Clone)]
pub struct CompanionStore {
    local: Arc<dyn KeyValueStorage>,
    session: Arc<dyn KeyValueStorage>,
    queries: Arc<Mutex<QueryCache>>,
}

impl CompanionStore {
    pub fn new(local: Arc<dyn KeyValueStorage>, session: Arc<dyn KeyValueStorage>) -> Self {
        Self {
            local,
            session,
            queries: Arc::new(Mutex::new(QueryCache::new())),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()), Arc::new(MemoryStorage::new()))
    }

    pub fn local(&self) -> &Arc<dyn KeyValueStorage> {
        &self.local
    }

    pub fn session(&self) -> &Arc<dyn KeyValueStorage> {
        &self.session
    }

    /// Lock the query cache. Never hold the guard across an `.await`.
    pub fn queries(&self) -> MutexGuard<'_, QueryCache> {
        self.queries.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn load_unit_cache(&self) -> Result<Option<CachedData<Vec<UnitEntry>>>> {
        let Some(contents) = self.local.get(UNIT_CACHE_KEY)? else {
            return Ok(None);
        };
        let cached = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse cached units: {}", UNIT_CACHE_KEY))?;
        Ok(Some(cached))
    }

    pub fn save_unit_cache(&self, units: &[UnitEntry]) -> Result<()> {
        let cached = CachedData::new(units);
        let contents = serde_json::to_string(&cached)?;
        self.local
            .set(UNIT_CACHE_KEY, &contents)
            .with_context(|| format!("Failed to write cached units: {}", UNIT_CACHE_KEY))?;
        Ok(())
    }
}

impl std::fmt::Debug for CompanionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompanionStore")
            .field("queries", &self.queries().len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_cache_round_trip() {
        let store = CompanionStore::in_memory();
        assert!(store.load_unit_cache().unwrap().is_none());

        store.save_unit_cache(&[UnitEntry::new("aide", "Aide", 25)]).unwrap();
        let cached = store.load_unit_cache().unwrap().unwrap();
        assert_eq!(cached.data.len(), 1);
        assert!(!cached.is_stale());
    }

    #[test]
    fn test_clones_share_storage() {
        let store = CompanionStore::in_memory();
        let other = store.clone();
        other.local().set("warcrow_theme", "dark").unwrap();
        assert_eq!(store.local().get("warcrow_theme").unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn test_corrupt_unit_cache_is_an_error() {
        let store = CompanionStore::in_memory();
        store.local().set(UNIT_CACHE_KEY, "{not json").unwrap();
        assert!(store.load_unit_cache().is_err());
    }
}
