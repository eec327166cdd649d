/// 24-bit colours of chemicals and of the beaker liquid, `#rrggbb` parsing and the
/// iterative pairwise blend used when chemicals are poured together.
pub mod color;
/// Formula display strings with Unicode subscripts
///
///  # Examples
/// ```
/// use VirtualLab::Chemistry::formula::display_formula;
/// assert_eq!(display_formula("NaHCO3"), "NaHCO₃");
/// ```
pub mod formula;
/// Catalog of selectable chemicals: built-in table or JSON file, validated at load time,
/// lookup by id.
///
///  # Examples
/// ```
/// use VirtualLab::Chemistry::chemicals::ChemicalRegistry;
/// let registry = ChemicalRegistry::builtin().unwrap();
/// for chemical in registry.iter() {
///     println!("{:<20} {:<10} {}", chemical.name, chemical.display_formula(), chemical.color);
/// }
/// ```
pub mod chemicals;
/// Ordered table of known reactions. A rule fires when all of its reactants are in the
/// beaker; the first rule in table order wins.
pub mod reactions;
/// What happens in the beaker after each addition: blended colour, fill level,
/// triggered reaction, and the reset to an empty beaker.
pub mod mixture_resolver;
/// User-defined chemicals with attributes suggested by an AI advisor, falling back to
/// fixed defaults when the advisor is absent or its answer is unusable.
pub mod custom_chemicals;
