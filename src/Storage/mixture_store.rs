//! # Mixture Persistence Adapter
//!
//! ## Purpose
//! Front door for saving and loading mixtures. It owns the storage strategy chosen at
//! construction and the most-recent-first list the UI shows (at most ten entries).
//!
//! ## Usage
//! ```rust, ignore
//! let config = LabConfig::load();
//! let mut store = MixtureStore::from_config(&config)?;
//! store.load();
//! let saved = store.save_selection(&beaker)?;
//! store.delete(&saved.id)?;
//! ```
//!
//! Operations are meant to be called one at a time in response to user actions; there
//! is no locking and no cancellation.

use super::backend::{MixtureBackend, StorageBackend, StorageError};
use super::mixture::{Mixture, push_recent};
use crate::Chemistry::mixture_resolver::Selection;
use crate::settings::{LabConfig, StorageMode};
use log::error;

pub struct MixtureStore {
    backend: StorageBackend,
    recent: Vec<Mixture>,
}

impl MixtureStore {
    pub fn new(backend: StorageBackend) -> Self {
        Self {
            backend,
            recent: Vec::new(),
        }
    }

    pub fn from_config(config: &LabConfig) -> Result<Self, StorageError> {
        Ok(Self::new(StorageBackend::from_config(config)?))
    }

    pub fn mode(&self) -> StorageMode {
        self.backend.mode()
    }

    /// Mixtures as of the last load or change, newest first.
    pub fn recent(&self) -> &[Mixture] {
        &self.recent
    }

    pub fn find(&self, id: &str) -> Option<&Mixture> {
        self.recent.iter().find(|m| m.id == id)
    }

    /// Reloads the list from the backend. Never fails.
    pub fn load(&mut self) -> &[Mixture] {
        self.recent = self.backend.load();
        &self.recent
    }

    /// Snapshots the beaker and saves it. Empty beakers are refused.
    pub fn save_selection(&mut self, selection: &Selection) -> Result<Mixture, StorageError> {
        let mixture = Mixture::from_selection(selection)?;
        self.save(&mixture)
    }

    /// Save errors are returned as they are; nothing is written anywhere else.
    pub fn save(&mut self, mixture: &Mixture) -> Result<Mixture, StorageError> {
        if mixture.chemicals.is_empty() {
            return Err(StorageError::EmptyMixture);
        }
        let stored = self.backend.save(mixture).map_err(|e| {
            error!("Saving mixture '{}' failed: {}", mixture.name, e);
            e
        })?;
        push_recent(&mut self.recent, stored.clone());
        Ok(stored)
    }

    pub fn delete(&mut self, id: &str) -> Result<(), StorageError> {
        self.backend.delete(id)?;
        self.recent.retain(|m| m.id != id);
        Ok(())
    }

    pub fn clear_all(&mut self) -> Result<usize, StorageError> {
        let removed = self.backend.clear_all()?;
        self.recent.clear();
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Chemistry::chemicals::ChemicalRegistry;
    use crate::Chemistry::mixture_resolver::MixtureResolver;
    use crate::Chemistry::reactions::ReactionTable;
    use crate::Storage::local_backend::LocalBackend;
    use crate::Storage::local_store::{
        JsonFileStore, KeyValueStore, MIXTURES_KEY, MemoryStore, MixtureCache,
    };
    use std::sync::Arc;
    use tempfile::tempdir;

    fn local_store(memory: &MemoryStore) -> MixtureStore {
        MixtureStore::new(StorageBackend::Local(LocalBackend::new(MixtureCache::new(
            Box::new(memory.clone()),
        ))))
    }

    fn beaker(ids: &[&str]) -> Selection {
        let registry = ChemicalRegistry::builtin().unwrap();
        let resolver = MixtureResolver::new(Arc::new(ReactionTable::builtin().unwrap()));
        ids.iter().fold(resolver.reset(), |s, id| {
            resolver.add_chemical(s, registry.get(id).unwrap().clone())
        })
    }

    #[test]
    fn test_save_selection_updates_recent() {
        let memory = MemoryStore::new();
        let mut store = local_store(&memory);
        assert_eq!(store.mode(), StorageMode::Local);
        let saved = store.save_selection(&beaker(&["vinegar", "baking-soda"])).unwrap();
        assert_eq!(saved.name, "Vinegar + Baking Soda");
        assert_eq!(store.recent().len(), 1);
        assert!(store.find(&saved.id).is_some());
    }

    #[test]
    fn test_empty_beaker_is_refused() {
        let memory = MemoryStore::new();
        let mut store = local_store(&memory);
        assert!(matches!(
            store.save_selection(&beaker(&[])),
            Err(StorageError::EmptyMixture)
        ));
        assert!(store.recent().is_empty());
        assert_eq!(memory.get(MIXTURES_KEY).unwrap(), None);
    }

    #[test]
    fn test_eleventh_save_drops_oldest() {
        let mut store = local_store(&MemoryStore::new());
        let mut ids = Vec::new();
        for _ in 0..11 {
            ids.push(store.save_selection(&beaker(&["water"])).unwrap().id);
        }
        assert_eq!(store.recent().len(), 10);
        assert_eq!(store.recent()[0].id, ids[10]);
        assert!(store.find(&ids[0]).is_none());
        assert_eq!(store.load().len(), 10);
    }

    #[test]
    fn test_delete_missing_id_leaves_list() {
        let mut store = local_store(&MemoryStore::new());
        store.save_selection(&beaker(&["water"])).unwrap();
        store.save_selection(&beaker(&["salt"])).unwrap();
        let before = store.recent().to_vec();
        store.delete("not-there").unwrap();
        assert_eq!(store.recent(), before.as_slice());
        assert_eq!(store.load(), before.as_slice());
    }

    #[test]
    fn test_corrupt_cache_loads_empty() {
        let mut memory = MemoryStore::new();
        memory.set(MIXTURES_KEY, "definitely { not json").unwrap();
        let mut store = local_store(&memory);
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_clear_all() {
        let mut store = local_store(&MemoryStore::new());
        store.save_selection(&beaker(&["water"])).unwrap();
        store.save_selection(&beaker(&["salt"])).unwrap();
        assert_eq!(store.clear_all().unwrap(), 2);
        assert!(store.recent().is_empty());
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_from_config_local_file_survives_restart() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lab_store.json");
        let mut config = LabConfig::default();
        config.local_store_path = path.to_str().unwrap().to_string();

        let mut store = MixtureStore::from_config(&config).unwrap();
        let saved = store.save_selection(&beaker(&["copper-sulfate", "water"])).unwrap();

        let mut reopened = MixtureStore::from_config(&config).unwrap();
        assert_eq!(reopened.load(), &[saved][..]);
        assert!(JsonFileStore::new(&path).get(MIXTURES_KEY).unwrap().is_some());
    }
}
