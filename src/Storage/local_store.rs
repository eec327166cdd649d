//! # Local key-value storage
//!
//! ## Purpose
//! Stand-in for the browser's localStorage: a flat string-to-string store where all
//! structured data is JSON-serialized before writing and parsed after reading.
//!
//! ## Main Data Structures
//! - `KeyValueStore`: trait for the store (injected, so tests can use memory)
//! - `JsonFileStore`: one JSON object on disk holding all keys; read-modify-write on
//!   every change, no locking (single writer assumed)
//! - `MemoryStore`: in-process store; clones share the same map
//! - `MixtureCache`: the list of saved mixtures kept under `savedMixtures`
//!
//! ## Corruption
//! A cache value that is not valid JSON reads as an empty list and a warning is
//! logged; nothing is thrown past the cache. Cached entries without chemicals are
//! dropped on read. A store file that is not a JSON object is moved aside to
//! `<file>.corrupt` before the store starts over, so the next write cannot destroy it.

use super::backend::StorageError;
use super::mixture::{MAX_SAVED_MIXTURES, Mixture, push_recent};
use log::{debug, error, warn};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Key under which the mixture list is cached.
pub const MIXTURES_KEY: &str = "savedMixtures";

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// All keys in a single JSON object file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where an unreadable store file is moved to
    pub fn backup_path(&self) -> PathBuf {
        let mut backup = self.path.clone().into_os_string();
        backup.push(".corrupt");
        PathBuf::from(backup)
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&self.path)?;
        match serde_json::from_str(&content) {
            Ok(map) => Ok(map),
            Err(e) => {
                let backup = self.backup_path();
                error!(
                    "Local store '{}' is corrupt ({}), moving it to '{}' and starting empty",
                    self.path.display(),
                    e,
                    backup.display()
                );
                fs::rename(&self.path, &backup)?;
                Ok(BTreeMap::new())
            }
        }
    }

    fn write_all(&self, map: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(map)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut map = self.read_all()?;
        map.insert(key.to_string(), value.to_string());
        self.write_all(&map)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        let mut map = self.read_all()?;
        if map.remove(key).is_some() {
            self.write_all(&map)?;
        }
        Ok(())
    }
}

/// In-memory store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    map: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.map.borrow().get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.map.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.map.borrow_mut().remove(key);
        Ok(())
    }
}

/// Most-recent-first list of mixtures serialized under one key.
pub struct MixtureCache {
    store: Box<dyn KeyValueStore>,
    key: String,
}

impl MixtureCache {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self::with_key(store, MIXTURES_KEY)
    }

    pub fn with_key(store: Box<dyn KeyValueStore>, key: &str) -> Self {
        Self {
            store,
            key: key.to_string(),
        }
    }

    /// Cached list; unreadable or corrupt data gives an empty list.
    pub fn read(&self) -> Vec<Mixture> {
        let raw = match self.store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("Cannot read mixture cache '{}': {}", self.key, e);
                return Vec::new();
            }
        };
        match serde_json::from_str::<Vec<Mixture>>(&raw) {
            Ok(mut list) => {
                list.retain(|m| {
                    if m.chemicals.is_empty() {
                        warn!("Dropping cached mixture '{}' without chemicals", m.id);
                    }
                    !m.chemicals.is_empty()
                });
                list.truncate(MAX_SAVED_MIXTURES);
                list
            }
            Err(e) => {
                warn!("Mixture cache '{}' is corrupt: {}", self.key, e);
                Vec::new()
            }
        }
    }

    pub fn write(&mut self, list: &[Mixture]) -> Result<(), StorageError> {
        let capped = &list[..list.len().min(MAX_SAVED_MIXTURES)];
        let raw = serde_json::to_string(capped)?;
        self.store.set(&self.key, &raw)
    }

    pub fn prepend(&mut self, mixture: Mixture) -> Result<(), StorageError> {
        let mut list = self.read();
        push_recent(&mut list, mixture);
        self.write(&list)
    }

    /// Returns false when the id was not cached; the cache is then left untouched.
    pub fn remove(&mut self, id: &str) -> Result<bool, StorageError> {
        let mut list = self.read();
        let before = list.len();
        list.retain(|m| m.id != id);
        if list.len() == before {
            debug!("Mixture '{}' not in cache, nothing to delete", id);
            return Ok(false);
        }
        self.write(&list)?;
        Ok(true)
    }

    pub fn clear(&mut self) -> Result<(), StorageError> {
        self.store.remove(&self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Chemistry::chemicals::ChemicalRegistry;
    use tempfile::tempdir;

    fn water_mixture() -> Mixture {
        let registry = ChemicalRegistry::builtin().unwrap();
        let water = registry.get("water").unwrap().clone();
        Mixture::new(vec![water.clone()], water.color).unwrap()
    }

    #[test]
    fn test_memory_store_clones_share_data() {
        let store = MemoryStore::new();
        let mut writer = store.clone();
        writer.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        writer.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn test_file_store_persists_between_instances() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");
        let mut store = JsonFileStore::new(&path);
        assert_eq!(store.get("a").unwrap(), None);
        store.set("a", "1").unwrap();
        store.set("b", "2").unwrap();
        let other = JsonFileStore::new(&path);
        assert_eq!(other.get("a").unwrap().as_deref(), Some("1"));
        store.remove("a").unwrap();
        assert_eq!(other.get("a").unwrap(), None);
        assert_eq!(other.get("b").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn test_file_store_corrupt_file_reads_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "][").unwrap();
        let mut store = JsonFileStore::new(&path);
        assert_eq!(store.get("savedMixtures").unwrap(), None);
        store.set("x", "y").unwrap();
        assert_eq!(store.get("x").unwrap().as_deref(), Some("y"));
    }

    #[test]
    fn test_file_store_keeps_corrupt_file_aside() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "{\"savedMixtures\": \"[]\", \"other\": ").unwrap();
        let mut store = JsonFileStore::new(&path);
        store.set("x", "y").unwrap();
        let backup = store.backup_path();
        assert_eq!(backup, dir.path().join("store.json.corrupt"));
        assert_eq!(
            fs::read_to_string(&backup).unwrap(),
            "{\"savedMixtures\": \"[]\", \"other\": "
        );
        assert_eq!(store.get("x").unwrap().as_deref(), Some("y"));
    }

    #[test]
    fn test_cache_prepend_and_read() {
        let memory = MemoryStore::new();
        let mut cache = MixtureCache::new(Box::new(memory.clone()));
        assert!(cache.read().is_empty());
        let first = water_mixture();
        let second = water_mixture();
        cache.prepend(first.clone()).unwrap();
        cache.prepend(second.clone()).unwrap();
        let list = cache.read();
        assert_eq!(list, vec![second, first]);
        assert!(memory.get(MIXTURES_KEY).unwrap().is_some());
    }

    #[test]
    fn test_cache_corrupt_value_reads_empty() {
        let mut memory = MemoryStore::new();
        memory.set(MIXTURES_KEY, "{this is not json").unwrap();
        let cache = MixtureCache::new(Box::new(memory));
        assert!(cache.read().is_empty());
    }

    #[test]
    fn test_cache_drops_entries_without_chemicals() {
        let mut memory = MemoryStore::new();
        let kept = water_mixture();
        let mut empty = water_mixture();
        empty.chemicals.clear();
        memory
            .set(MIXTURES_KEY, &serde_json::to_string(&[empty, kept.clone()]).unwrap())
            .unwrap();
        let cache = MixtureCache::new(Box::new(memory));
        assert_eq!(cache.read(), vec![kept]);
    }

    #[test]
    fn test_cache_remove_unknown_is_noop() {
        let memory = MemoryStore::new();
        let mut cache = MixtureCache::new(Box::new(memory.clone()));
        cache.prepend(water_mixture()).unwrap();
        let raw_before = memory.get(MIXTURES_KEY).unwrap();
        assert!(!cache.remove("no-such-id").unwrap());
        assert_eq!(memory.get(MIXTURES_KEY).unwrap(), raw_before);
        assert_eq!(cache.read().len(), 1);
    }

    #[test]
    fn test_cache_clear_removes_key() {
        let memory = MemoryStore::new();
        let mut cache = MixtureCache::new(Box::new(memory.clone()));
        cache.prepend(water_mixture()).unwrap();
        cache.clear().unwrap();
        assert_eq!(memory.get(MIXTURES_KEY).unwrap(), None);
        assert!(cache.read().is_empty());
    }

    #[test]
    fn test_cache_write_caps_list() {
        let mut cache = MixtureCache::new(Box::new(MemoryStore::new()));
        let list: Vec<Mixture> = (0..15).map(|_| water_mixture()).collect();
        cache.write(&list).unwrap();
        assert_eq!(cache.read(), list[..MAX_SAVED_MIXTURES].to_vec());
    }
}
