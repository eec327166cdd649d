//! # Liquid colour module
//!
//! ## Purpose
//! Colours of chemicals and of the liquid in the beaker are stored as 24-bit RGB
//! values and exchanged with the rendering layer as `#rrggbb` strings.
//!
//! ## Blending
//! The beaker colour is a running accumulator: every new chemical is averaged
//! channel by channel with the colour already in the beaker. The step is symmetric
//! for two colours, but a chain of three or more additions depends on the order
//! and is NOT the arithmetic mean of all colours. `blend` reproduces exactly that
//! left fold.
//!
//! ```rust
//! use VirtualLab::Chemistry::color::Rgb;
//! let red = Rgb::from_hex("#ff0000").unwrap();
//! let green = Rgb::from_hex("#00ff00").unwrap();
//! assert_eq!(red.average(green).to_hex(), "#808000");
//! ```

use super::chemicals::ChemistryError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 24-bit colour. Serialized as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses `#rrggbb` (hex digits in either case). Short forms, missing `#`,
    /// named colours and alpha channels are rejected.
    pub fn from_hex(hex: &str) -> Result<Self, ChemistryError> {
        let invalid = || ChemistryError::InvalidColor(hex.to_string());
        let digits = hex.strip_prefix('#').ok_or_else(invalid)?;
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| invalid());
        Ok(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Midpoint of two colours per channel.
    ///
    /// Halves round up, not down: `#ff0000` with `#00ff00` must give `#808000`
    /// (a floored midpoint would give `#7f7f00`).
    pub fn average(self, other: Rgb) -> Rgb {
        let mid = |a: u8, b: u8| ((a as u16 + b as u16 + 1) / 2) as u8;
        Rgb {
            r: mid(self.r, other.r),
            g: mid(self.g, other.g),
            b: mid(self.b, other.b),
        }
    }
}

/// Iterative pairwise blend in the given order. `None` for no colours.
pub fn blend<I>(colors: I) -> Option<Rgb>
where
    I: IntoIterator<Item = Rgb>,
{
    colors.into_iter().reduce(|acc, next| acc.average(next))
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl TryFrom<String> for Rgb {
    type Error = ChemistryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Rgb::from_hex(&value)
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_hex()
    }
}
