//! Saved mixtures: a named snapshot of the beaker contents.

use super::backend::StorageError;
use crate::Chemistry::chemicals::Chemical;
use crate::Chemistry::color::Rgb;
use crate::Chemistry::mixture_resolver::Selection;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Most-recent-first lists of mixtures never hold more than this.
pub const MAX_SAVED_MIXTURES: usize = 10;

/// A named combination of chemicals. The chemicals are copies taken at save time,
/// so later catalog changes do not alter saved mixtures. Never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mixture {
    pub id: String,
    pub name: String,
    pub chemicals: Vec<Chemical>,
    pub color: Rgb,
    pub created_at: DateTime<Utc>,
}

impl Mixture {
    /// Snapshot of the current beaker. The name joins the chemical names with " + ".
    pub fn from_selection(selection: &Selection) -> Result<Self, StorageError> {
        Self::new(selection.chemicals.clone(), selection.color)
    }

    pub fn new(chemicals: Vec<Chemical>, color: Rgb) -> Result<Self, StorageError> {
        if chemicals.is_empty() {
            return Err(StorageError::EmptyMixture);
        }
        let name = chemicals
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(" + ");
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            chemicals,
            color,
            created_at: Utc::now(),
        })
    }

    pub fn chemical_ids(&self) -> Vec<&str> {
        self.chemicals.iter().map(|c| c.id.as_str()).collect()
    }
}

/// Puts `mixture` in front and drops whatever falls past the cap.
pub fn push_recent(list: &mut Vec<Mixture>, mixture: Mixture) {
    list.insert(0, mixture);
    list.truncate(MAX_SAVED_MIXTURES);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Chemistry::chemicals::ChemicalRegistry;
    use crate::Chemistry::mixture_resolver::MixtureResolver;
    use crate::Chemistry::reactions::ReactionTable;
    use std::sync::Arc;

    #[test]
    fn test_from_selection_snapshots_contents() {
        let registry = ChemicalRegistry::builtin().unwrap();
        let resolver = MixtureResolver::new(Arc::new(ReactionTable::builtin().unwrap()));
        let mut beaker = resolver.reset();
        beaker = resolver.add_chemical(beaker, registry.get("vinegar").unwrap().clone());
        beaker = resolver.add_chemical(beaker, registry.get("baking-soda").unwrap().clone());

        let mixture = Mixture::from_selection(&beaker).unwrap();
        assert_eq!(mixture.name, "Vinegar + Baking Soda");
        assert_eq!(mixture.color, beaker.color);
        assert_eq!(mixture.chemical_ids(), vec!["vinegar", "baking-soda"]);

        // the selection can go on without touching the snapshot
        let beaker = resolver.add_chemical(beaker, registry.get("water").unwrap().clone());
        assert_eq!(beaker.len(), 3);
        assert_eq!(mixture.chemicals.len(), 2);
    }

    #[test]
    fn test_empty_selection_rejected() {
        let resolver = MixtureResolver::new(Arc::new(ReactionTable::builtin().unwrap()));
        assert!(matches!(
            Mixture::from_selection(&resolver.reset()),
            Err(StorageError::EmptyMixture)
        ));
    }

    #[test]
    fn test_push_recent_caps_list() {
        let registry = ChemicalRegistry::builtin().unwrap();
        let water = registry.get("water").unwrap().clone();
        let mut list = Vec::new();
        let mut ids = Vec::new();
        for _ in 0..11 {
            let m = Mixture::new(vec![water.clone()], water.color).unwrap();
            ids.push(m.id.clone());
            push_recent(&mut list, m);
        }
        assert_eq!(list.len(), MAX_SAVED_MIXTURES);
        assert_eq!(list[0].id, ids[10]);
        // the first one saved is gone
        assert!(list.iter().all(|m| m.id != ids[0]));
    }

    #[test]
    fn test_json_shape() {
        let registry = ChemicalRegistry::builtin().unwrap();
        let salt = registry.get("salt").unwrap().clone();
        let mixture = Mixture::new(vec![salt.clone()], salt.color).unwrap();
        let value = serde_json::to_value(&mixture).unwrap();
        assert_eq!(value["color"], "#ffffff");
        assert!(value.get("createdAt").is_some());
        assert_eq!(value["chemicals"][0]["id"], "salt");
        let back: Mixture = serde_json::from_value(value).unwrap();
        assert_eq!(back, mixture);
    }
}
