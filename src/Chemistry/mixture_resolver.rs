//! # Mixture Resolver
//!
//! ## Purpose
//! Decides what the beaker looks like after every addition: the blended liquid
//! colour, the fill level and the reaction (if any) that the current contents
//! trigger.
//!
//! ## Key Logic
//! 1. **Level**: `min(level + increment, max_level)`; overflowing is a silent clamp.
//! 2. **Colour**: the first chemical sets the colour, every further chemical is
//!    averaged with the running colour only (`Rgb::average`), so three or more
//!    additions depend on the order.
//! 3. **Reaction**: the set of ids in the beaker is matched against the reaction
//!    table, first satisfied rule in table order wins.
//!
//! ## Usage
//! ```rust
//! use std::sync::Arc;
//! use VirtualLab::Chemistry::chemicals::ChemicalRegistry;
//! use VirtualLab::Chemistry::reactions::ReactionTable;
//! use VirtualLab::Chemistry::mixture_resolver::MixtureResolver;
//!
//! let registry = ChemicalRegistry::builtin().unwrap();
//! let resolver = MixtureResolver::new(Arc::new(ReactionTable::builtin().unwrap()));
//! let mut beaker = resolver.reset();
//! beaker = resolver.add_chemical(beaker, registry.get("vinegar").unwrap().clone());
//! beaker = resolver.add_chemical(beaker, registry.get("baking-soda").unwrap().clone());
//! assert_eq!(beaker.reaction.as_ref().unwrap().id, "acid-carbonate");
//! ```

use super::chemicals::{Chemical, FlameIntensity};
use super::color::Rgb;
use super::reactions::{ReactionRule, ReactionTable, VisualEffect};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// Constants of the virtual beaker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeakerSettings {
    pub default_color: Rgb,
    pub default_level: f64,
    pub level_increment: f64,
    pub max_level: f64,
}

impl Default for BeakerSettings {
    fn default() -> Self {
        Self {
            default_color: Rgb::new(0x00, 0xaa, 0xff),
            default_level: 0.5,
            level_increment: 0.3,
            max_level: 1.4,
        }
    }
}

/// Transient contents of the beaker since the last reset.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub chemicals: Vec<Chemical>,
    pub color: Rgb,
    pub level: f64,
    pub reaction: Option<ReactionRule>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.chemicals.is_empty()
    }

    pub fn len(&self) -> usize {
        self.chemicals.len()
    }

    /// Distinct ids in the beaker
    pub fn ids(&self) -> HashSet<&str> {
        self.chemicals.iter().map(|c| c.id.as_str()).collect()
    }

    /// "Vinegar + Baking Soda"
    pub fn name(&self) -> String {
        self.chemicals
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(" + ")
    }

    /// Strongest flame among flammable chemicals in the beaker
    pub fn flame(&self) -> Option<FlameIntensity> {
        self.chemicals.iter().filter_map(|c| c.flammability).max()
    }

    /// What the rendering layer needs after an addition.
    pub fn render_update(&self) -> RenderUpdate {
        RenderUpdate {
            color: self.color.to_hex(),
            level: self.level,
            reaction_description: self.reaction.as_ref().map(|r| r.description.clone()),
            effect: self.reaction.as_ref().map(|r| r.effect),
            flame: self.flame(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderUpdate {
    pub color: String,
    pub level: f64,
    pub reaction_description: Option<String>,
    pub effect: Option<VisualEffect>,
    pub flame: Option<FlameIntensity>,
}

#[derive(Debug, Clone)]
pub struct MixtureResolver {
    reactions: Arc<ReactionTable>,
    settings: BeakerSettings,
}

impl MixtureResolver {
    pub fn new(reactions: Arc<ReactionTable>) -> Self {
        Self::with_settings(reactions, BeakerSettings::default())
    }

    pub fn with_settings(reactions: Arc<ReactionTable>, settings: BeakerSettings) -> Self {
        Self {
            reactions,
            settings,
        }
    }

    pub fn settings(&self) -> &BeakerSettings {
        &self.settings
    }

    pub fn reactions(&self) -> &ReactionTable {
        &self.reactions
    }

    /// Empty beaker with the default colour and level.
    pub fn reset(&self) -> Selection {
        Selection {
            chemicals: Vec::new(),
            color: self.settings.default_color,
            level: self.settings.default_level,
            reaction: None,
        }
    }

    /// Next fill level, clamped to the maximum.
    pub fn next_level(&self, level: f64) -> f64 {
        (level + self.settings.level_increment).min(self.settings.max_level)
    }

    /// Colour after pouring `added` into the beaker.
    pub fn next_color(&self, selection: &Selection, added: Rgb) -> Rgb {
        if selection.is_empty() {
            added
        } else {
            selection.color.average(added)
        }
    }

    /// Appends `chemical`, updates colour and level and re-runs the reaction check.
    pub fn add_chemical(&self, selection: Selection, chemical: Chemical) -> Selection {
        let color = self.next_color(&selection, chemical.color);
        let level = self.next_level(selection.level);
        debug!(
            "Adding '{}' to beaker: colour {} -> {}, level {:.2} -> {:.2}",
            chemical.id, selection.color, color, selection.level, level
        );
        let mut chemicals = selection.chemicals;
        chemicals.push(chemical);
        let mut next = Selection {
            chemicals,
            color,
            level,
            reaction: None,
        };
        next.reaction = self.check_reaction(&next).cloned();
        if let Some(rule) = &next.reaction {
            info!("Reaction '{}' triggered ({})", rule.id, rule.effect.as_str());
        }
        next
    }

    /// First rule of the table whose reactants are all in the beaker.
    pub fn check_reaction(&self, selection: &Selection) -> Option<&ReactionRule> {
        self.reactions.first_match(&selection.ids())
    }
}
