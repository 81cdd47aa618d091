use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;

use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::debug;

use super::{CacheStorage, PlatformError};

/// Named caches held in memory, each a map of request URL to body.
#[derive(Debug, Default)]
pub struct MemoryCacheStorage {
    caches: Mutex<BTreeMap<String, BTreeMap<String, Vec<u8>>>>,
}

impl MemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, cache: &str, url: &str, body: Vec<u8>) {
        self.lock()
            .entry(cache.to_string())
            .or_default()
            .insert(url.to_string(), body);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, BTreeMap<String, Vec<u8>>>> {
        self.caches.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl CacheStorage for MemoryCacheStorage {
    fn keys(&self) -> BoxFuture<'_, Result<Vec<String>, PlatformError>> {
        let names = self.lock().keys().cloned().collect();
        async move { Ok(names) }.boxed()
    }

    fn delete<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<bool, PlatformError>> {
        let removed = self.lock().remove(name).is_some();
        async move { Ok(removed) }.boxed()
    }
}

/// Named caches on disk: every subdirectory of `root` is one cache.
#[derive(Debug, Clone)]
pub struct DirCacheStorage {
    root: PathBuf,
}

impl DirCacheStorage {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn list(&self) -> Result<Vec<String>, PlatformError> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn remove(&self, name: &str) -> Result<bool, PlatformError> {
        if name.is_empty() || name.contains(|c: char| c == '/' || c == '\\') || name == "." || name == ".." {
            return Err(PlatformError::NotPermitted(format!("cache name {:?}", name)));
        }
        match std::fs::remove_dir_all(self.root.join(name)) {
            Ok(()) => {
                debug!(cache = name, "Deleted cache directory");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

impl CacheStorage for DirCacheStorage {
    fn keys(&self) -> BoxFuture<'_, Result<Vec<String>, PlatformError>> {
        async move { self.list() }.boxed()
    }

    fn delete<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<bool, PlatformError>> {
        async move { self.remove(name) }.boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_cache_storage() {
        let storage = MemoryCacheStorage::new();
        storage.put("images-v1", "/img/aide.webp", vec![1, 2, 3]);
        storage.put("api-v1", "/api/units", b"[]".to_vec());

        assert_eq!(storage.keys().await.unwrap(), vec!["api-v1", "images-v1"]);
        assert!(storage.delete("api-v1").await.unwrap());
        assert!(!storage.delete("api-v1").await.unwrap());
        assert_eq!(storage.len(), 1);
    }

    #[tokio::test]
    async fn test_dir_cache_storage() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("images-v1")).unwrap();
        std::fs::write(dir.path().join("images-v1").join("aide.webp"), b"img").unwrap();
        std::fs::write(dir.path().join("stray.txt"), b"x").unwrap();

        let storage = DirCacheStorage::new(dir.path().to_path_buf());
        assert_eq!(storage.keys().await.unwrap(), vec!["images-v1"]);
        assert!(storage.delete("images-v1").await.unwrap());
        assert!(storage.keys().await.unwrap().is_empty());
        assert!(dir.path().join("stray.txt").exists());
    }

    #[tokio::test]
    async fn test_dir_cache_storage_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let storage = DirCacheStorage::new(dir.path().to_path_buf());
        assert!(matches!(
            storage.delete("..").await,
            Err(PlatformError::NotPermitted(_))
        ));
    }

    #[tokio::test]
    async fn test_dir_cache_storage_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let storage = DirCacheStorage::new(dir.path().join("absent"));
        assert!(storage.keys().await.unwrap().is_empty());
    }
}
