//! The single-byte "native" encoding.
//!
//! Native strings store one byte per character in a legacy codepage chosen at
//! build time: Windows-1252 by default, or Mac-Roman / ISO-8859-1 through the
//! `mac-roman` and `latin-1` features. Every byte maps to exactly one Unicode
//! scalar value, so the mapping is a bijection between the 256 bytes and a
//! fixed set of 256 characters. Bytes Windows-1252 leaves undefined map to the
//! C1 control characters of the same value, which keeps round trips total.
//!
//! The fold and case tables are derived from the Unicode single character
//! case mappings, so a native comparison always agrees with the Unicode
//! comparison of the same characters.

use once_cell::sync::Lazy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Codepage {
  Windows1252,
  MacRoman,
  Latin1,
}

#[cfg(feature = "mac-roman")]
pub const NATIVE_CODEPAGE: Codepage = Codepage::MacRoman;

#[cfg(all(feature = "latin-1", not(feature = "mac-roman")))]
pub const NATIVE_CODEPAGE: Codepage = Codepage::Latin1;

#[cfg(not(any(feature = "latin-1", feature = "mac-roman")))]
pub const NATIVE_CODEPAGE: Codepage = Codepage::Windows1252;

/// Windows-1252 bytes 0x80..0xA0.
const WINDOWS_1252_HIGH: [u16; 32] = [
  0x20AC, 0x0081, 0x201A, 0x0192, 0x201E, 0x2026, 0x2020, 0x2021, 0x02C6, 0x2030, 0x0160, 0x2039,
  0x0152, 0x008D, 0x017D, 0x008F, 0x0090, 0x2018, 0x2019, 0x201C, 0x201D, 0x2022, 0x2013, 0x2014,
  0x02DC, 0x2122, 0x0161, 0x203A, 0x0153, 0x009D, 0x017E, 0x0178,
];

/// Mac-Roman bytes 0x80..=0xFF.
const MAC_ROMAN_HIGH: [u16; 128] = [
  0x00C4, 0x00C5, 0x00C7, 0x00C9, 0x00D1, 0x00D6, 0x00DC, 0x00E1, 0x00E0, 0x00E2, 0x00E4, 0x00E3,
  0x00E5, 0x00E7, 0x00E9, 0x00E8, 0x00EA, 0x00EB, 0x00ED, 0x00EC, 0x00EE, 0x00EF, 0x00F1, 0x00F3,
  0x00F2, 0x00F4, 0x00F6, 0x00F5, 0x00FA, 0x00F9, 0x00FB, 0x00FC, 0x2020, 0x00B0, 0x00A2, 0x00A3,
  0x00A7, 0x2022, 0x00B6, 0x00DF, 0x00AE, 0x00A9, 0x2122, 0x00B4, 0x00A8, 0x2260, 0x00C6, 0x00D8,
  0x221E, 0x00B1, 0x2264, 0x2265, 0x00A5, 0x00B5, 0x2202, 0x2211, 0x220F, 0x03C0, 0x222B, 0x00AA,
  0x00BA, 0x03A9, 0x00E6, 0x00F8, 0x00BF, 0x00A1, 0x00AC, 0x221A, 0x0192, 0x2248, 0x2206, 0x00AB,
  0x00BB, 0x2026, 0x00A0, 0x00C0, 0x00C3, 0x00D5, 0x0152, 0x0153, 0x2013, 0x2014, 0x201C, 0x201D,
  0x2018, 0x2019, 0x00F7, 0x25CA, 0x00FF, 0x0178, 0x2044, 0x20AC, 0x2039, 0x203A, 0xFB01, 0xFB02,
  0x2021, 0x00B7, 0x201A, 0x201E, 0x2030, 0x00C2, 0x00CA, 0x00C1, 0x00CB, 0x00C8, 0x00CD, 0x00CE,
  0x00CF, 0x00CC, 0x00D3, 0x00D4, 0xF8FF, 0x00D2, 0x00DA, 0x00DB, 0x00D9, 0x0131, 0x02C6, 0x02DC,
  0x00AF, 0x02D8, 0x02D9, 0x02DA, 0x00B8, 0x02DD, 0x02DB, 0x02C7,
];

static WINDOWS_1252_REVERSE: Lazy<Vec<(u32, u8)>> =
  Lazy::new(|| build_reverse(Codepage::Windows1252));
static MAC_ROMAN_REVERSE: Lazy<Vec<(u32, u8)>> = Lazy::new(|| build_reverse(Codepage::MacRoman));

fn build_reverse(codepage: Codepage) -> Vec<(u32, u8)> {
  let mut table: Vec<(u32, u8)> = (0x80..=0xFFu8)
    .map(|byte| (codepage.to_unicode(byte) as u32, byte))
    .collect();
  table.sort_unstable();
  table
}

impl Codepage {
  #[inline]
  pub fn to_unicode(self, byte: u8) -> char {
    let cp = match self {
      _ if byte < 0x80 => byte as u32,
      Codepage::Latin1 => byte as u32,
      Codepage::Windows1252 if byte < 0xA0 => WINDOWS_1252_HIGH[(byte - 0x80) as usize] as u32,
      Codepage::Windows1252 => byte as u32,
      Codepage::MacRoman => MAC_ROMAN_HIGH[(byte - 0x80) as usize] as u32,
    };
    char::from_u32(cp).unwrap_or(char::REPLACEMENT_CHARACTER)
  }

  #[inline]
  pub fn from_unicode(self, ch: char) -> Option<u8> {
    let cp = ch as u32;
    if cp < 0x80 {
      return Some(cp as u8);
    }
    let table = match self {
      Codepage::Latin1 => return (cp < 0x100).then_some(cp as u8),
      Codepage::Windows1252 if (0xA0..0x100).contains(&cp) => return Some(cp as u8),
      Codepage::Windows1252 => WINDOWS_1252_REVERSE.as_slice(),
      Codepage::MacRoman => MAC_ROMAN_REVERSE.as_slice(),
    };
    table
      .binary_search_by_key(&cp, |&(unicode, _)| unicode)
      .ok()
      .map(|idx| table[idx].1)
  }
}

#[inline]
pub fn native_to_char(byte: u8) -> char {
  NATIVE_CODEPAGE.to_unicode(byte)
}

#[inline]
pub fn native_to_unit(byte: u8) -> u16 {
  // Every native character lives in the BMP.
  native_to_char(byte) as u32 as u16
}

#[inline]
pub fn char_to_native(ch: char) -> Option<u8> {
  NATIVE_CODEPAGE.from_unicode(ch)
}

/// Maps one UTF-16 code unit to a native byte. Surrogates never map.
#[inline]
pub fn unit_to_native(unit: u16) -> Option<u8> {
  if unit < 0x80 {
    return Some(unit as u8);
  }
  char::from_u32(unit as u32).and_then(char_to_native)
}

struct CaseTables {
  fold:  [u8; 256],
  upper: [u8; 256],
}

impl CaseTables {
  fn build(codepage: Codepage) -> Self {
    let mut fold = [0u8; 256];
    let mut upper = [0u8; 256];
    for byte in 0..=255u8 {
      let ch = codepage.to_unicode(byte);
      fold[byte as usize] = single(ch.to_lowercase())
        .and_then(|c| codepage.from_unicode(c))
        .unwrap_or(byte);
      upper[byte as usize] = single(ch.to_uppercase())
        .and_then(|c| codepage.from_unicode(c))
        .unwrap_or(byte);
    }
    Self { fold, upper }
  }
}

fn single(mut chars: impl Iterator<Item = char>) -> Option<char> {
  let first = chars.next()?;
  chars.next().is_none().then_some(first)
}

static CASE_TABLES: Lazy<CaseTables> = Lazy::new(|| CaseTables::build(NATIVE_CODEPAGE));

/// Case-insensitive canonical form of a native byte.
#[inline]
pub fn fold(byte: u8) -> u8 {
  CASE_TABLES.fold[byte as usize]
}

#[inline]
pub fn lowercase(byte: u8) -> u8 {
  fold(byte)
}

#[inline]
pub fn uppercase(byte: u8) -> u8 {
  CASE_TABLES.upper[byte as usize]
}

/// Folds `byte` and reports whether it has any case variant at all.
///
/// Uncased bytes fold to themselves under every strategy, which lets callers
/// fall back to exact comparison.
#[inline]
pub fn checked_fold(byte: u8) -> (u8, bool) {
  let folded = fold(byte);
  (folded, folded != byte || uppercase(byte) != byte)
}

pub fn lowercase_bytes(bytes: &mut [u8]) {
  for byte in bytes {
    *byte = lowercase(*byte);
  }
}

pub fn uppercase_bytes(bytes: &mut [u8]) {
  for byte in bytes {
    *byte = uppercase(*byte);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const ALL: [Codepage; 3] = [Codepage::Windows1252, Codepage::MacRoman, Codepage::Latin1];

  #[test]
  fn every_codepage_round_trips() {
    for codepage in ALL {
      for byte in 0..=255u8 {
        let ch = codepage.to_unicode(byte);
        assert_eq!(codepage.from_unicode(ch), Some(byte), "{codepage:?} {byte:#x}");
      }
    }
  }

  #[test]
  fn windows_1252_specials() {
    let cp = Codepage::Windows1252;
    assert_eq!(cp.to_unicode(0x80), '€');
    assert_eq!(cp.to_unicode(0x81), '\u{81}');
    assert_eq!(cp.from_unicode('Ÿ'), Some(0x9F));
    assert_eq!(cp.from_unicode('Ā'), None);
    assert_eq!(cp.from_unicode('😀'), None);
  }

  #[test]
  fn mac_roman_specials() {
    let cp = Codepage::MacRoman;
    assert_eq!(cp.to_unicode(0x80), 'Ä');
    assert_eq!(cp.to_unicode(0xDB), '€');
    assert_eq!(cp.from_unicode('π'), Some(0xB9));
    assert_eq!(cp.from_unicode('\u{A4}'), None);
  }

  #[test]
  fn windows_1252_fold_matches_expected_pairs() {
    let tables = CaseTables::build(Codepage::Windows1252);
    for byte in b'A'..=b'Z' {
      assert_eq!(tables.fold[byte as usize], byte + 0x20);
    }
    for byte in 0xC0..=0xDEu8 {
      let expected = if byte == 0xD7 { byte } else { byte + 0x20 };
      assert_eq!(tables.fold[byte as usize], expected, "{byte:#x}");
    }
    assert_eq!(tables.fold[0x8A], 0x9A);
    assert_eq!(tables.fold[0x8C], 0x9C);
    assert_eq!(tables.fold[0x8E], 0x9E);
    assert_eq!(tables.fold[0x9F], 0xFF);
    assert_eq!(tables.upper[0xFF], 0x9F);
    // Sharp s has no single character uppercase.
    assert_eq!(tables.upper[0xDF], 0xDF);
  }

  #[test]
  fn mac_roman_omega_keeps_its_case() {
    let tables = CaseTables::build(Codepage::MacRoman);
    assert_eq!(Codepage::MacRoman.to_unicode(0xBD), 'Ω');
    assert_eq!(tables.fold[0xBD], 0xBD);
    assert_eq!(crate::unicode::fold_char('Ω'), 'ω');
  }

  #[test]
  fn checked_fold_reports_cased_bytes() {
    assert_eq!(checked_fold(b'A'), (b'a', true));
    assert_eq!(checked_fold(b'a'), (b'a', true));
    assert_eq!(checked_fold(b','), (b',', false));
    assert_eq!(checked_fold(b'7'), (b'7', false));
  }

  #[test]
  fn unit_mapping_rejects_surrogates() {
    assert_eq!(unit_to_native(0xD800), None);
    assert_eq!(unit_to_native(b'x' as u16), Some(b'x'));
    assert_eq!(native_to_unit(b'x'), b'x' as u16);
  }
}
