use super::backend::{MixtureBackend, StorageError};
use super::local_store::MixtureCache;
use super::mixture::Mixture;
use crate::settings::StorageMode;
use log::info;

/// Local mode: the mixture cache is the only copy.
pub struct LocalBackend {
    cache: MixtureCache,
}

impl LocalBackend {
    pub fn new(cache: MixtureCache) -> Self {
        Self { cache }
    }
}

impl MixtureBackend for LocalBackend {
    fn mode(&self) -> StorageMode {
        StorageMode::Local
    }

    fn save(&mut self, mixture: &Mixture) -> Result<Mixture, StorageError> {
        self.cache.prepend(mixture.clone())?;
        info!("Saved mixture '{}' locally", mixture.name);
        Ok(mixture.clone())
    }

    fn load(&mut self) -> Vec<Mixture> {
        self.cache.read()
    }

    fn delete(&mut self, id: &str) -> Result<(), StorageError> {
        self.cache.remove(id)?;
        Ok(())
    }

    fn clear_all(&mut self) -> Result<usize, StorageError> {
        let count = self.cache.read().len();
        self.cache.clear()?;
        info!("Cleared {} locally saved mixtures", count);
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Chemistry::chemicals::ChemicalRegistry;
    use crate::Storage::local_store::{KeyValueStore, MIXTURES_KEY, MemoryStore};

    fn mixture(id: &str) -> Mixture {
        let registry = ChemicalRegistry::builtin().unwrap();
        let salt = registry.get("salt").unwrap().clone();
        let mut m = Mixture::new(vec![salt.clone()], salt.color).unwrap();
        m.id = id.to_string();
        m
    }

    #[test]
    fn test_save_load_delete_clear() {
        let memory = MemoryStore::new();
        let mut backend = LocalBackend::new(MixtureCache::new(Box::new(memory.clone())));
        assert_eq!(backend.mode(), StorageMode::Local);
        assert!(backend.load().is_empty());

        backend.save(&mixture("a")).unwrap();
        backend.save(&mixture("b")).unwrap();
        let ids: Vec<String> = backend.load().into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec!["b", "a"]);

        backend.delete("a").unwrap();
        assert_eq!(backend.load().len(), 1);
        backend.delete("a").unwrap();
        assert_eq!(backend.load().len(), 1);

        assert_eq!(backend.clear_all().unwrap(), 1);
        assert!(backend.load().is_empty());
        assert_eq!(memory.get(MIXTURES_KEY).unwrap(), None);
    }

    #[test]
    fn test_eleventh_save_drops_oldest() {
        let mut backend = LocalBackend::new(MixtureCache::new(Box::new(MemoryStore::new())));
        for i in 0..11 {
            backend.save(&mixture(&format!("m{}", i))).unwrap();
        }
        let list = backend.load();
        assert_eq!(list.len(), 10);
        assert_eq!(list[0].id, "m10");
        assert_eq!(list[9].id, "m1");
    }

    #[test]
    fn test_corrupt_cache_loads_empty() {
        let mut memory = MemoryStore::new();
        memory.set(MIXTURES_KEY, "not json at all").unwrap();
        let mut backend = LocalBackend::new(MixtureCache::new(Box::new(memory)));
        assert!(backend.load().is_empty());
    }
}
