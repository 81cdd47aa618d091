use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::{KeyValueStorage, StorageError};

const ENTRY_EXTENSION: &str = "json";

/// Directory-backed storage: each key is stored as `<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: PathBuf) -> Result<Self, StorageError> {
        std::fs::create_dir_all(&dir).map_err(|source| StorageError::Io {
            key: dir.display().to_string(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        if !is_valid_key(key) {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{}.{}", key, ENTRY_EXTENSION)))
    }
}

fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

fn io_error(key: &str, source: std::io::Error) -> StorageError {
    StorageError::Io {
        key: key.to_string(),
        source,
    }
}

impl KeyValueStorage for FileStorage {
    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error("*", e)),
        };

        let mut keys = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| io_error("*", e))?.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some(ENTRY_EXTENSION) {
                continue;
            }
            match path.file_stem().and_then(|s| s.to_str()) {
                Some(stem) if is_valid_key(stem) => keys.push(stem.to_string()),
                _ => debug!(path = %path.display(), "Skipping file that is not a storage key"),
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.entry_path(key)?;
        match std::fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(key, e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.entry_path(key)?;
        std::fs::write(&path, value).map_err(|e| io_error(key, e))
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.entry_path(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(key, e)),
        }
    }

    fn clear(&self) -> Result<(), StorageError> {
        let keys = self.keys()?;
        debug!(dir = %self.dir.display(), count = keys.len(), "Clearing file storage");
        let mut first_error = None;
        for key in keys {
            if let Err(e) = self.remove(&key) {
                warn!(key = %key, error = %e, "Failed to remove stored key");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_values() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("local")).unwrap();

        storage.set("warcrow_unit_cache_v1", r#"[{"id":"aide"}]"#).unwrap();
        storage.set("sb-auth-token", "{}").unwrap();

        assert_eq!(
            storage.get("warcrow_unit_cache_v1").unwrap().as_deref(),
            Some(r#"[{"id":"aide"}]"#)
        );
        assert_eq!(
            storage.keys().unwrap(),
            vec!["sb-auth-token", "warcrow_unit_cache_v1"]
        );
    }

    #[test]
    fn test_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();
        assert_eq!(storage.get("nothing").unwrap(), None);
        storage.remove("nothing").unwrap();
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();
        assert!(matches!(
            storage.set("../escape", "x"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(storage.get(""), Err(StorageError::InvalidKey(_))));
    }

    #[test]
    fn test_clear_ignores_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();
        storage.set("a", "1").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "keep").unwrap();

        storage.clear().unwrap();
        assert!(storage.is_empty().unwrap());
        assert!(dir.path().join("notes.txt").exists());
    }

    #[test]
    fn test_clear_skips_stray_json_files() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();
        storage.set("sb-auth-token", "{}").unwrap();
        storage.set("warcrow_unit_cache_v1", "[]").unwrap();
        std::fs::write(dir.path().join("a b.json"), "{}").unwrap();

        assert_eq!(
            storage.keys().unwrap(),
            vec!["sb-auth-token", "warcrow_unit_cache_v1"]
        );
        storage.clear().unwrap();
        assert!(storage.is_empty().unwrap());
    }
}
