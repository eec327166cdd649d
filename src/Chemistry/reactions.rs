//! # Reaction Rule Table
//!
//! Known reactions of the lab bench. A rule fires when every one of its reactant ids
//! is present in the beaker (subset test, duplicates and order of addition do not
//! matter). The table is an ordered list and the FIRST satisfied rule wins, so
//! declaration order is the tie-break between overlapping rules: a broader rule
//! declared earlier shadows a more specific one declared later.

use super::chemicals::{ChemicalRegistry, ChemistryError};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// What the rendering layer should show when a rule fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VisualEffect {
    Bubbling,
    ColorChange,
    Heat,
    Precipitate,
}

impl VisualEffect {
    pub fn as_str(&self) -> &'static str {
        match self {
            VisualEffect::Bubbling => "bubbling",
            VisualEffect::ColorChange => "color-change",
            VisualEffect::Heat => "heat",
            VisualEffect::Precipitate => "precipitate",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionRule {
    pub id: String,
    pub name: String,
    pub reactants: Vec<String>,
    pub description: String,
    pub effect: VisualEffect,
}

impl ReactionRule {
    pub fn new(
        id: &str,
        name: &str,
        reactants: &[&str],
        description: &str,
        effect: VisualEffect,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            reactants: reactants.iter().map(|r| r.to_string()).collect(),
            description: description.to_string(),
            effect,
        }
    }

    /// true when all reactants are among `present`
    pub fn is_satisfied_by(&self, present: &HashSet<&str>) -> bool {
        self.reactants.iter().all(|r| present.contains(r.as_str()))
    }
}

#[derive(Debug, Clone)]
pub struct ReactionTable {
    rules: Vec<ReactionRule>,
}

impl ReactionTable {
    pub fn new(rules: Vec<ReactionRule>) -> Result<Self, ChemistryError> {
        let mut seen = HashSet::new();
        for rule in &rules {
            if rule.reactants.is_empty() {
                return Err(ChemistryError::EmptyReactants(rule.id.clone()));
            }
            if !seen.insert(rule.id.as_str()) {
                return Err(ChemistryError::DuplicateRule(rule.id.clone()));
            }
        }
        Ok(Self { rules })
    }

    pub fn from_json_str(json: &str) -> Result<Self, ChemistryError> {
        let rules: Vec<ReactionRule> = serde_json::from_str(json)?;
        Self::new(rules)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ChemistryError> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn builtin() -> Result<Self, ChemistryError> {
        use VisualEffect::*;
        Self::new(vec![
            ReactionRule::new(
                "acid-carbonate",
                "Vinegar and Baking Soda",
                &["vinegar", "baking-soda"],
                "Acetic acid reacts with sodium bicarbonate: CO₂ gas bubbles up and foams over.",
                Bubbling,
            ),
            ReactionRule::new(
                "neutralization",
                "Acid-Base Neutralization",
                &["hydrochloric-acid", "sodium-hydroxide"],
                "HCl + NaOH → NaCl + H₂O. The neutralization releases heat and the beaker warms up.",
                Heat,
            ),
            ReactionRule::new(
                "elephant-toothpaste",
                "Elephant Toothpaste",
                &["hydrogen-peroxide", "potassium-iodide"],
                "Iodide catalyses the decomposition of hydrogen peroxide: a column of oxygen-filled foam shoots up.",
                Bubbling,
            ),
            ReactionRule::new(
                "silver-chloride",
                "Silver Chloride Precipitation",
                &["silver-nitrate", "salt"],
                "AgNO₃ + NaCl → AgCl↓ + NaNO₃. A white silver chloride precipitate forms.",
                Precipitate,
            ),
            ReactionRule::new(
                "copper-hydroxide",
                "Copper Hydroxide Precipitation",
                &["copper-sulfate", "sodium-hydroxide"],
                "CuSO₄ + 2NaOH → Cu(OH)₂↓ + Na₂SO₄. A pale blue precipitate settles.",
                Precipitate,
            ),
            ReactionRule::new(
                "phenolphthalein-base",
                "Indicator in Base",
                &["phenolphthalein", "sodium-hydroxide"],
                "Phenolphthalein turns bright pink in a basic solution.",
                ColorChange,
            ),
            ReactionRule::new(
                "magnesium-acid",
                "Magnesium in Acid",
                &["magnesium", "hydrochloric-acid"],
                "Mg + 2HCl → MgCl₂ + H₂↑. Hydrogen bubbles fizz off the ribbon.",
                Bubbling,
            ),
            ReactionRule::new(
                "iron-copper",
                "Iron Displaces Copper",
                &["iron-filings", "copper-sulfate"],
                "Fe + CuSO₄ → FeSO₄ + Cu. The blue solution fades to green as copper plates out.",
                ColorChange,
            ),
        ])
    }

    /// Logs and returns reactant ids that are not in the catalog. Such rules can still
    /// fire with custom chemicals, so this is a warning, not an error.
    pub fn validate_against(&self, registry: &ChemicalRegistry) -> Vec<String> {
        let mut missing = Vec::new();
        for rule in &self.rules {
            for reactant in &rule.reactants {
                if !registry.contains(reactant) {
                    warn!(
                        "Reaction rule '{}' references unknown chemical '{}'",
                        rule.id, reactant
                    );
                    missing.push(reactant.clone());
                }
            }
        }
        missing
    }

    /// First rule in table order whose reactants are all present.
    pub fn first_match(&self, present: &HashSet<&str>) -> Option<&ReactionRule> {
        self.rules.iter().find(|rule| rule.is_satisfied_by(present))
    }

    pub fn get(&self, id: &str) -> Option<&ReactionRule> {
        self.rules.iter().find(|rule| rule.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReactionRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
