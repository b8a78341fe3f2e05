//! Utility functions to traverse the grapheme clusters of UTF-16 text.
//!
//! Indices are code unit offsets. Carriage return and line feed are always
//! separate graphemes here, so a CR LF pair counts as two characters.

use crate::unicode::{
  BreakKind,
  Transcoded,
};

/// Below this code unit nothing combines with its neighbour, so every unit is
/// a grapheme of its own.
pub const TRIVIAL_LIMIT: u16 = 0x300;

/// Whether every code unit of `units` is its own grapheme.
#[inline]
pub fn is_trivial(units: &[u16]) -> bool {
  units.iter().all(|&unit| unit < TRIVIAL_LIMIT)
}

/// All grapheme boundaries of `units`, including `0` and `units.len()`.
pub fn grapheme_boundaries(units: &[u16]) -> Vec<usize> {
  if is_trivial(units) {
    return (0..=units.len()).collect();
  }
  Transcoded::from_units(units).boundaries(BreakKind::Grapheme)
}
