//! Comparison options and the comparison key sequence of a string.
//!
//! When both operands are native, comparisons run directly on bytes. Every
//! other combination is lowered to a sequence of [`Key`]s: the codepoints of
//! the text after the requested case folding and normalization, each
//! remembering which code units of the original it came from. Matching on
//! keys gives the same answers as matching on bytes would for the same text.

use smallvec::SmallVec;
use the_core::{
  grapheme,
  scan::Folding,
  unicode::{
    self,
    CaseMapping,
    NormalForm,
    fold_char,
  },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StringOptions {
  /// Code point identity.
  #[default]
  Exact,
  /// Canonically equivalent text compares equal, case matters.
  NonLiteral,
  /// Case folded, no normalization.
  Caseless,
  /// Case folded, then normalized.
  Folded,
}

impl StringOptions {
  pub fn from_sensitivity(case_sensitive: bool, form_sensitive: bool) -> Self {
    match (case_sensitive, form_sensitive) {
      (true, true) => StringOptions::Exact,
      (false, true) => StringOptions::Caseless,
      (true, false) => StringOptions::NonLiteral,
      (false, false) => StringOptions::Folded,
    }
  }

  #[inline]
  pub fn is_caseless(self) -> bool {
    matches!(self, StringOptions::Caseless | StringOptions::Folded)
  }

  #[inline]
  pub fn is_normalizing(self) -> bool {
    matches!(self, StringOptions::NonLiteral | StringOptions::Folded)
  }

  /// The byte comparison equivalent to these options on native text, which
  /// is always in normal form already.
  #[inline]
  pub fn folding(self) -> Folding {
    if self.is_caseless() {
      Folding::Caseless
    } else {
      Folding::Exact
    }
  }
}

/// One comparison unit: a codepoint of the folded and normalized text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Key {
  pub ch:    char,
  /// Code units of the source segment this key came from.
  pub start: usize,
  pub end:   usize,
  /// First key produced by its segment.
  pub first: bool,
  /// Last key produced by its segment.
  pub last:  bool,
}

/// Lowers `units` to comparison keys. Without normalization every codepoint
/// is its own segment; with it, every grapheme is.
pub fn keys(units: &[u16], options: StringOptions) -> Vec<Key> {
  let mut out = Vec::with_capacity(units.len());
  if !options.is_normalizing() {
    for (at, ch, width) in unicode::codepoints(units) {
      let ch = if options.is_caseless() { fold_char(ch) } else { ch };
      out.push(Key {
        ch,
        start: at,
        end: at + width,
        first: true,
        last: true,
      });
    }
    return out;
  }

  let service = unicode::service();
  let boundaries = grapheme::grapheme_boundaries(units);
  let mut segment = String::new();
  for window in boundaries.windows(2) {
    let (start, end) = (window[0], window[1]);
    segment.clear();
    segment.extend(unicode::codepoints(&units[start..end]).map(|(_, ch, _)| ch));
    let folded;
    let text = if options.is_caseless() {
      folded = service.case_map(&segment, CaseMapping::Fold, None);
      folded.as_str()
    } else {
      segment.as_str()
    };
    let normal: SmallVec<[char; 4]> = service.normalize(text, NormalForm::Nfc).chars().collect();
    let count = normal.len();
    out.extend(normal.into_iter().enumerate().map(|(idx, ch)| Key {
      ch,
      start,
      end,
      first: idx == 0,
      last: idx + 1 == count,
    }));
  }
  out
}

/// Whether `needle` matches `haystack` at key `at`, ending on a segment edge.
#[inline]
pub(crate) fn matches_at(haystack: &[Key], at: usize, needle: &[Key]) -> bool {
  let end = at + needle.len();
  !needle.is_empty()
    && end <= haystack.len()
    && haystack[at].first
    && haystack[end - 1].last
    && haystack[at..end]
      .iter()
      .zip(needle)
      .all(|(h, n)| h.ch == n.ch)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn utf16(s: &str) -> Vec<u16> {
    s.encode_utf16().collect()
  }

  fn chars(keys: &[Key]) -> String {
    keys.iter().map(|key| key.ch).collect()
  }

  #[test]
  fn sensitivity_table() {
    assert_eq!(StringOptions::from_sensitivity(true, true), StringOptions::Exact);
    assert_eq!(StringOptions::from_sensitivity(false, true), StringOptions::Caseless);
    assert_eq!(StringOptions::from_sensitivity(true, false), StringOptions::NonLiteral);
    assert_eq!(StringOptions::from_sensitivity(false, false), StringOptions::Folded);
  }

  #[test]
  fn caseless_keys_fold_per_codepoint() {
    let keys = keys(&utf16("AbÇ😀"), StringOptions::Caseless);
    assert_eq!(chars(&keys), "abç😀");
    assert_eq!((keys[3].start, keys[3].end), (3, 5));
  }

  #[test]
  fn normalizing_keys_compose_graphemes() {
    let keys = keys(&utf16("xe\u{301}"), StringOptions::NonLiteral);
    assert_eq!(chars(&keys), "xé");
    assert_eq!((keys[1].start, keys[1].end), (1, 3));
  }

  #[test]
  fn matches_respect_segment_edges() {
    // Normalizes to D with dot below plus a combining dot above; matching
    // only the first key would split the grapheme.
    let hay = keys(&utf16("a\u{1E0A}\u{323}b"), StringOptions::NonLiteral);
    assert_eq!(hay.len(), 4);
    let needle = keys(&utf16("\u{1E0C}"), StringOptions::NonLiteral);
    assert!(!matches_at(&hay, 1, &needle));
  }
}
