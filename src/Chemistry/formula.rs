//! Display helpers for chemical formulas.
//!
//! Formulas are kept in the catalog as plain ASCII ("CuSO4", "Ca(OH)2") and turned
//! into subscripted display strings ("CuSO₄", "Ca(OH)₂") for the UI. Digits that
//! follow an element symbol or a closing bracket are stoichiometric indices; a
//! leading coefficient ("2H2O") is left as is.
//!
//! # Examples
//! ```
//! use VirtualLab::Chemistry::formula::display_formula;
//! assert_eq!(display_formula("H2O"), "H₂O");
//! assert_eq!(display_formula("Ca(OH)2"), "Ca(OH)₂");
//! ```
use regex::Regex;
use std::sync::OnceLock;

const SUBSCRIPTS: [char; 10] = ['₀', '₁', '₂', '₃', '₄', '₅', '₆', '₇', '₈', '₉'];

fn index_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([A-Za-z\)\]])(\d+)").expect("static regex"))
}

fn formula_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\d*(?:[A-Z][a-z]?\d*|[\(\[][A-Za-z\d]+[\)\]]\d*|[·\.]\d*)+$")
            .expect("static regex")
    })
}

fn to_subscript(digits: &str) -> String {
    digits
        .chars()
        .map(|c| c.to_digit(10).map_or(c, |d| SUBSCRIPTS[d as usize]))
        .collect()
}

/// Converts stoichiometric indices of an ASCII formula into Unicode subscripts.
pub fn display_formula(formula: &str) -> String {
    index_regex()
        .replace_all(formula, |caps: &regex::Captures| {
            format!("{}{}", &caps[1], to_subscript(&caps[2]))
        })
        .into_owned()
}

/// Rough structural check for a formula string: element symbols, indices,
/// brackets and hydrate dots. It does not check that the elements exist.
pub fn looks_like_formula(candidate: &str) -> bool {
    let candidate = candidate.trim();
    !candidate.is_empty() && formula_regex().is_match(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_formula() {
        assert_eq!(display_formula("CuSO4"), "CuSO₄");
        assert_eq!(display_formula("CH3COOH"), "CH₃COOH");
        assert_eq!(display_formula("C20H14O4"), "C₂₀H₁₄O₄");
        assert_eq!(display_formula("Ca(OH)2"), "Ca(OH)₂");
        assert_eq!(display_formula("2H2O"), "2H₂O");
        assert_eq!(display_formula("NaCl"), "NaCl");
    }

    #[test]
    fn test_looks_like_formula() {
        assert!(looks_like_formula("H2O"));
        assert!(looks_like_formula("Na(NO3)2"));
        assert!(looks_like_formula("CuSO4·5H2O"));
        assert!(looks_like_formula(" NaHCO3 "));
        assert!(!looks_like_formula(""));
        assert!(!looks_like_formula("water"));
        assert!(!looks_like_formula("H2O is water"));
    }
}
