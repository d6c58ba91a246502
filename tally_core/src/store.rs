//! Flat key-value blob storage with file locking.
//!
//! Every piece of state (attendance book, GPA rows, tasks, expenses, theme)
//! is one blob under a fixed key. `FileStore` keeps each blob in its own
//! file and writes it atomically; `MemoryStore` keeps them in a map.

use crate::{Error, Result};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::PathBuf;
use tempfile::NamedTempFile;

/// Attendance book: schedule, counters, mark history
pub const ATTENDANCE_KEY: &str = "att_smart_v2";
/// GPA course rows
pub const GPA_KEY: &str = "gpa_v1";
/// Theme preference, stored as plain text
pub const THEME_KEY: &str = "theme";
pub const TASKS_KEY: &str = "tasks_v1";
pub const EXPENSES_KEY: &str = "expenses_v1";

/// All keys owned by the application
pub const ALL_KEYS: [&str; 5] = [ATTENDANCE_KEY, GPA_KEY, THEME_KEY, TASKS_KEY, EXPENSES_KEY];

/// Key-value blob store
pub trait KvStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
    /// Remove every key owned by the application
    fn clear(&mut self) -> Result<()>;
}

/// Read and decode a JSON blob
///
/// Returns `Ok(None)` if the key is absent. Undecodable contents are an error.
pub fn load_json<T: DeserializeOwned>(store: &dyn KvStore, key: &str) -> Result<Option<T>> {
    match store.get(key)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Read a JSON blob, falling back to the default value
///
/// A missing key or a corrupt blob both yield `T::default()`; corruption is
/// logged so the views can still render.
pub fn load_or_default<T: DeserializeOwned + Default>(store: &dyn KvStore, key: &str) -> Result<T> {
    let raw = match store.get(key)? {
        Some(raw) => raw,
        None => {
            tracing::debug!("No blob stored under {}, using default", key);
            return Ok(T::default());
        }
    };

    match serde_json::from_str::<T>(&raw) {
        Ok(value) => Ok(value),
        Err(e) => {
            tracing::warn!("Failed to parse blob {}: {}. Using defaults.", key, e);
            Ok(T::default())
        }
    }
}

/// Encode a value as compact JSON and store it
pub fn save_json<T: Serialize>(store: &mut dyn KvStore, key: &str, value: &T) -> Result<()> {
    let contents = serde_json::to_string(value)?;
    store.set(key, &contents)
}

// ============================================================================
// In-memory store
// ============================================================================

/// Map-backed store
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    blobs: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.blobs.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.blobs.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.blobs.remove(key);
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.blobs.clear();
        Ok(())
    }
}

// ============================================================================
// File store
// ============================================================================

/// One file per key under a data directory
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir`; the directory is created lazily on
    /// first write
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the file holding `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KvStore for FileStore {
    /// Read a blob with a shared lock
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }

        let file = File::open(&path)?;
        file.lock_shared()?;

        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        file.unlock()?;
        read?;

        tracing::debug!("Read blob {} from {:?}", key, path);
        Ok(Some(contents))
    }

    /// Write a blob atomically
    ///
    /// Contents go to a locked temp file in the same directory, are synced,
    /// then renamed over the old blob.
    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);

        let temp = NamedTempFile::new_in(&self.dir)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            writer.write_all(value.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(&path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved blob {} to {:?}", key, path);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        match std::fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!("Removed blob {} at {:?}", key, path);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn clear(&mut self) -> Result<()> {
        for key in ALL_KEYS {
            self.remove(key)?;
        }
        tracing::info!("Cleared all blobs in {:?}", self.dir);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AttendanceCounter;
    use std::collections::HashMap;

    #[test]
    fn test_file_store_roundtrip() {
        crate::logging::init_test();
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(temp_dir.path().join("data"));

        store.set(THEME_KEY, "dark").unwrap();
        assert_eq!(store.get(THEME_KEY).unwrap(), Some("dark".to_string()));
        assert!(store.path_for(THEME_KEY).exists());
    }

    #[test]
    fn test_file_store_missing_key() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(temp_dir.path());
        assert_eq!(store.get(GPA_KEY).unwrap(), None);
    }

    #[test]
    fn test_atomic_set_leaves_no_temp_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(temp_dir.path());

        store.set(TASKS_KEY, "[]").unwrap();
        store.set(TASKS_KEY, "[1]").unwrap();

        let extras: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != "tasks_v1.json")
            .collect();
        assert!(
            extras.is_empty(),
            "Expected only tasks_v1.json, found extras: {:?}",
            extras
        );
        assert_eq!(store.get(TASKS_KEY).unwrap(), Some("[1]".to_string()));
    }

    #[test]
    fn test_clear_removes_known_keys_only() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(temp_dir.path());
        store.set(ATTENDANCE_KEY, "{}").unwrap();
        store.set(THEME_KEY, "light").unwrap();
        std::fs::write(temp_dir.path().join("config.toml"), "").unwrap();

        store.clear().unwrap();

        assert_eq!(store.get(ATTENDANCE_KEY).unwrap(), None);
        assert_eq!(store.get(THEME_KEY).unwrap(), None);
        assert!(temp_dir.path().join("config.toml").exists());
    }

    #[test]
    fn test_remove_missing_is_ok() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(temp_dir.path());
        store.remove(EXPENSES_KEY).unwrap();
    }

    #[test]
    fn test_typed_roundtrip_preserves_integers() {
        let mut store = MemoryStore::new();
        let mut stats = HashMap::new();
        stats.insert("Physics".to_string(), AttendanceCounter::new(4_000_000_001, 4_000_000_003));

        save_json(&mut store, ATTENDANCE_KEY, &stats).unwrap();
        let loaded: HashMap<String, AttendanceCounter> =
            load_json(&store, ATTENDANCE_KEY).unwrap().unwrap();
        assert_eq!(loaded, stats);
    }

    #[test]
    fn test_load_or_default_on_corruption() {
        let mut store = MemoryStore::new();
        store.set(GPA_KEY, "{ invalid json }").unwrap();

        let rows: Vec<u32> = load_or_default(&store, GPA_KEY).unwrap();
        assert!(rows.is_empty());
        assert!(load_json::<Vec<u32>>(&store, GPA_KEY).is_err());
    }

    #[test]
    fn test_memory_store_clear() {
        let mut store = MemoryStore::new();
        store.set(THEME_KEY, "dark").unwrap();
        store.set(TASKS_KEY, "[]").unwrap();
        assert_eq!(store.len(), 2);
        store.clear().unwrap();
        assert!(store.is_empty());
    }
}
