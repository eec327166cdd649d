//! # Chemical Registry Module
//!
//! ## Purpose
//! Fixed vocabulary of chemicals that can be put into the virtual beaker. The
//! registry is built once at startup (from the built-in table or from a JSON
//! catalog) and then shared read-only with the resolver and the UI.
//!
//! ## Main Data Structures
//! - `Chemical`: immutable catalog entry (id, name, formula, colour, physical state,
//!   optional pH, optional flammability)
//! - `ChemicalRegistry`: ordered list of chemicals plus an id index
//! - `ChemistryError`: validation failures of catalogs and rule tables
//!
//! ## Validation
//! Every check happens when the registry is built: malformed colours never get past
//! deserialization (`Rgb` parses on the way in), duplicate ids and pH values outside
//! 0..14 are rejected by `ChemicalRegistry::new`. Lookups of unknown ids return
//! `None` and are never an error.
//!
//! ## Usage
//! ```rust
//! use VirtualLab::Chemistry::chemicals::ChemicalRegistry;
//! let registry = ChemicalRegistry::builtin().unwrap();
//! let vinegar = registry.get("vinegar").unwrap();
//! assert_eq!(vinegar.formula, "CH3COOH");
//! assert!(registry.get("unobtainium").is_none());
//! ```

use super::color::Rgb;
use super::formula::display_formula;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChemistryError {
    #[error("Invalid colour '{0}': expected #rrggbb")]
    InvalidColor(String),
    #[error("Duplicate chemical id '{0}' in catalog")]
    DuplicateChemical(String),
    #[error("pH {ph} of chemical '{id}' is outside 0..14")]
    InvalidPh { id: String, ph: f64 },
    #[error("Chemical catalog is empty")]
    EmptyCatalog,
    #[error("Reaction rule '{0}' has no reactants")]
    EmptyReactants(String),
    #[error("Duplicate reaction rule id '{0}'")]
    DuplicateRule(String),
    #[error("Failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse catalog: {0}")]
    Json(#[from] serde_json::Error),
}

/// Physical state: solid, liquid, gas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PhysicalState {
    Solid,
    #[default]
    Liquid,
    Gas,
}

impl PhysicalState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhysicalState::Solid => "solid",
            PhysicalState::Liquid => "liquid",
            PhysicalState::Gas => "gas",
        }
    }

    /// Case-insensitive, also accepts the usual (s)/(l)/(g)/(aq) marks
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().trim_matches(|c| c == '(' || c == ')').to_lowercase().as_str() {
            "solid" | "s" | "powder" | "crystal" | "crystals" => Some(PhysicalState::Solid),
            "liquid" | "l" | "aq" | "aqueous" | "solution" => Some(PhysicalState::Liquid),
            "gas" | "g" | "vapor" | "vapour" => Some(PhysicalState::Gas),
            _ => None,
        }
    }
}

/// How strongly a flammable chemical burns; drives the size of the fire effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlameIntensity {
    Low,
    Medium,
    High,
}

/// Catalog entry. JSON field names follow the browser app (camelCase).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chemical {
    pub id: String,
    pub name: String,
    pub formula: String,
    pub color: Rgb,
    pub state: PhysicalState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ph: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flammability: Option<FlameIntensity>,
    /// true for chemicals synthesized by the user at runtime
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub custom: bool,
}

impl Chemical {
    pub fn new(
        id: &str,
        name: &str,
        formula: &str,
        color: &str,
        state: PhysicalState,
    ) -> Result<Self, ChemistryError> {
        Ok(Self {
            id: id.to_string(),
            name: name.to_string(),
            formula: formula.to_string(),
            color: Rgb::from_hex(color)?,
            state,
            ph: None,
            flammability: None,
            custom: false,
        })
    }

    pub fn with_ph(mut self, ph: f64) -> Self {
        self.ph = Some(ph);
        self
    }

    pub fn with_flammability(mut self, intensity: FlameIntensity) -> Self {
        self.flammability = Some(intensity);
        self
    }

    pub fn is_flammable(&self) -> bool {
        self.flammability.is_some()
    }

    pub fn display_formula(&self) -> String {
        display_formula(&self.formula)
    }
}

/// Read-only, ordered catalog of chemicals with lookup by id.
#[derive(Debug, Clone)]
pub struct ChemicalRegistry {
    chemicals: Vec<Chemical>,
    index: HashMap<String, usize>,
}

impl ChemicalRegistry {
    /// Builds a registry, keeping declaration order.
    pub fn new(chemicals: Vec<Chemical>) -> Result<Self, ChemistryError> {
        if chemicals.is_empty() {
            return Err(ChemistryError::EmptyCatalog);
        }
        let mut index = HashMap::with_capacity(chemicals.len());
        for (i, chemical) in chemicals.iter().enumerate() {
            if let Some(ph) = chemical.ph {
                if !(0.0..=14.0).contains(&ph) {
                    return Err(ChemistryError::InvalidPh {
                        id: chemical.id.clone(),
                        ph,
                    });
                }
            }
            if index.insert(chemical.id.clone(), i).is_some() {
                return Err(ChemistryError::DuplicateChemical(chemical.id.clone()));
            }
        }
        Ok(Self { chemicals, index })
    }

    /// Catalog as a JSON array of chemicals.
    pub fn from_json_str(json: &str) -> Result<Self, ChemistryError> {
        let chemicals: Vec<Chemical> = serde_json::from_str(json)?;
        Self::new(chemicals)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ChemistryError> {
        let content = fs::read_to_string(path.as_ref())?;
        let registry = Self::from_json_str(&content)?;
        info!(
            "Loaded {} chemicals from '{}'",
            registry.len(),
            path.as_ref().display()
        );
        Ok(registry)
    }

    /// Built-in catalog of the lab bench.
    pub fn builtin() -> Result<Self, ChemistryError> {
        use PhysicalState::*;
        let chemicals = vec![
            Chemical::new("water", "Water", "H2O", "#e0f7ff", Liquid)?.with_ph(7.0),
            Chemical::new("salt", "Table Salt", "NaCl", "#ffffff", Solid)?.with_ph(7.0),
            Chemical::new("vinegar", "Vinegar", "CH3COOH", "#f5f5dc", Liquid)?.with_ph(2.4),
            Chemical::new("baking-soda", "Baking Soda", "NaHCO3", "#fafafa", Solid)?.with_ph(8.3),
            Chemical::new("hydrochloric-acid", "Hydrochloric Acid", "HCl", "#f0fff0", Liquid)?
                .with_ph(1.0),
            Chemical::new("sodium-hydroxide", "Sodium Hydroxide", "NaOH", "#f8f8ff", Solid)?
                .with_ph(14.0),
            Chemical::new("copper-sulfate", "Copper Sulfate", "CuSO4", "#1e90ff", Solid)?
                .with_ph(4.0),
            Chemical::new(
                "hydrogen-peroxide",
                "Hydrogen Peroxide",
                "H2O2",
                "#e6f2ff",
                Liquid,
            )?
            .with_ph(6.2),
            Chemical::new("potassium-iodide", "Potassium Iodide", "KI", "#fffaf0", Solid)?
                .with_ph(7.0),
            Chemical::new("silver-nitrate", "Silver Nitrate", "AgNO3", "#f5f5f5", Solid)?
                .with_ph(6.0),
            Chemical::new("phenolphthalein", "Phenolphthalein", "C20H14O4", "#fff5ee", Liquid)?
                .with_ph(7.0),
            Chemical::new("ethanol", "Ethanol", "C2H5OH", "#f8f8ff", Liquid)?
                .with_ph(7.3)
                .with_flammability(FlameIntensity::High),
            Chemical::new("magnesium", "Magnesium Ribbon", "Mg", "#c0c0c0", Solid)?
                .with_flammability(FlameIntensity::Medium),
            Chemical::new("iron-filings", "Iron Filings", "Fe", "#5a5a5a", Solid)?
                .with_flammability(FlameIntensity::Low),
            Chemical::new("oxygen", "Oxygen", "O2", "#d6ecff", Gas)?,
        ];
        Self::new(chemicals)
    }

    pub fn get(&self, id: &str) -> Option<&Chemical> {
        self.index.get(id).map(|&i| &self.chemicals[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Chemical> {
        self.chemicals.iter()
    }

    pub fn ids(&self) -> HashSet<&str> {
        self.index.keys().map(|k| k.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.chemicals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chemicals.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_builtin_catalog_is_valid() {
        let registry = ChemicalRegistry::builtin().unwrap();
        assert!(registry.len() >= 10);
        for chemical in registry.iter() {
            assert_eq!(registry.get(&chemical.id), Some(chemical));
            assert!(!chemical.name.is_empty());
            assert!(crate::Chemistry::formula::looks_like_formula(&chemical.formula));
        }
    }

    #[test]
    fn test_lookup_keeps_order_and_misses_quietly() {
        let registry = ChemicalRegistry::builtin().unwrap();
        assert_eq!(registry.iter().next().unwrap().id, "water");
        assert!(registry.get("unobtainium").is_none());
        assert!(!registry.contains("unobtainium"));
        assert!(registry.ids().contains("baking-soda"));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let a = Chemical::new("x", "X", "X", "#000000", PhysicalState::Solid).unwrap();
        let b = Chemical::new("x", "Other X", "X2", "#111111", PhysicalState::Gas).unwrap();
        let result = ChemicalRegistry::new(vec![a, b]);
        assert!(matches!(result, Err(ChemistryError::DuplicateChemical(id)) if id == "x"));
    }

    #[test]
    fn test_ph_out_of_range_rejected() {
        let a = Chemical::new("acid", "Acid", "HX", "#000000", PhysicalState::Liquid)
            .unwrap()
            .with_ph(-1.0);
        assert!(matches!(
            ChemicalRegistry::new(vec![a]),
            Err(ChemistryError::InvalidPh { .. })
        ));
        assert!(matches!(
            ChemicalRegistry::new(vec![]),
            Err(ChemistryError::EmptyCatalog)
        ));
    }

    #[test]
    fn test_malformed_color_rejected_at_load() {
        let json = r##"[{"id":"ink","name":"Ink","formula":"C","color":"#12345","state":"liquid"}]"##;
        assert!(matches!(
            ChemicalRegistry::from_json_str(json),
            Err(ChemistryError::Json(_))
        ));
        assert!(Chemical::new("ink", "Ink", "C", "blue", PhysicalState::Liquid).is_err());
    }

    #[test]
    fn test_catalog_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(
            br##"[
                {"id":"water","name":"Water","formula":"H2O","color":"#e0f7ff","state":"liquid","ph":7},
                {"id":"ethanol","name":"Ethanol","formula":"C2H5OH","color":"#f8f8ff","state":"liquid","flammability":"high"}
            ]"##,
        )
        .unwrap();
        let registry = ChemicalRegistry::from_json_file(file.path()).unwrap();
        assert_eq!(registry.len(), 2);
        let ethanol = registry.get("ethanol").unwrap();
        assert!(ethanol.is_flammable());
        assert_eq!(ethanol.flammability, Some(FlameIntensity::High));
        assert_eq!(registry.get("water").unwrap().ph, Some(7.0));
        assert!(!ethanol.custom);
    }

    #[test]
    fn test_physical_state_parse() {
        assert_eq!(PhysicalState::parse("Solid"), Some(PhysicalState::Solid));
        assert_eq!(PhysicalState::parse("(aq)"), Some(PhysicalState::Liquid));
        assert_eq!(PhysicalState::parse(" g "), Some(PhysicalState::Gas));
        assert_eq!(PhysicalState::parse("plasma"), None);
        assert_eq!(PhysicalState::default().as_str(), "liquid");
    }

    #[test]
    fn test_display_formula_on_chemical() {
        let registry = ChemicalRegistry::builtin().unwrap();
        assert_eq!(registry.get("copper-sulfate").unwrap().display_formula(), "CuSO₄");
    }
}
