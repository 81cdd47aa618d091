use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::models::UnitEntry;
use crate::storage::{KeyClass, StorageKey};

/// Consider cached query results stale after 1 hour.
const CACHE_STALE_MINUTES: i64 = 60;

/// Query namespace holding unit catalog results.
pub const UNITS_NAMESPACE: &str = "units";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        let now = Utc::now();
        (now - self.cached_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Includes clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            if minutes % 60 >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            if (minutes % 1440) / 60 >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }

    pub fn is_stale(&self) -> bool {
        self.age_minutes() > CACHE_STALE_MINUTES
    }
}

/// Structured query key, e.g. `["units", "northern-tribes"]`.
///
/// The first part is the namespace; cleanup decisions look only at it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(parts.into_iter().map(Into::into).collect())
    }

    pub fn namespace(&self) -> &str {
        self.0.first().map(String::as_str).unwrap_or_default()
    }

    pub fn parts(&self) -> &[String] {
        &self.0
    }

    /// Unit, faction or army queries.
    pub fn is_catalog(&self) -> bool {
        StorageKey::parse(self.namespace()).class() == KeyClass::Catalog
    }
}

impl std::fmt::Display for QueryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

/// In-memory query cache.
///
/// Owned by the `CompanionStore`; nothing here is persisted.
#[derive(Debug, Default)]
pub struct QueryCache {
    entries: HashMap<QueryKey, CachedData<serde_json::Value>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &QueryKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn set_data<T: Serialize>(&mut self, key: QueryKey, data: &T) -> serde_json::Result<()> {
        let value = serde_json::to_value(data)?;
        self.entries.insert(key, CachedData::new(value));
        Ok(())
    }

    pub fn get_data<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<CachedData<T>> {
        let cached = self.entries.get(key)?;
        match serde_json::from_value(cached.data.clone()) {
            Ok(data) => Some(CachedData {
                data,
                cached_at: cached.cached_at,
            }),
            Err(e) => {
                debug!(key = %key, error = %e, "Cached query has unexpected shape");
                None
            }
        }
    }

    /// Drop every entry matching `predicate`, returning how many were dropped.
    pub fn invalidate_where(&mut self, predicate: impl Fn(&QueryKey) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !predicate(key));
        before - self.entries.len()
    }

    pub fn invalidate_catalog(&mut self) -> usize {
        self.invalidate_where(QueryKey::is_catalog)
    }

    /// Unit entries from every cached `units` query.
    ///
    /// Accepts results holding a list of units or a single unit.
    pub fn cached_units(&self) -> Vec<UnitEntry> {
        let mut units = Vec::new();
        for (key, cached) in &self.entries {
            if key.namespace() != UNITS_NAMESPACE {
                continue;
            }
            if let Ok(list) = serde_json::from_value::<Vec<UnitEntry>>(cached.data.clone()) {
                units.extend(list);
            } else if let Ok(unit) = serde_json::from_value::<UnitEntry>(cached.data.clone()) {
                units.push(unit);
            } else {
                debug!(key = %key, "Skipping units query with unexpected shape");
            }
        }
        units
    }
}
