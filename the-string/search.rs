//! Comparison, hashing and searching.
//!
//! Each operation has a byte fast path for two native operands and a key
//! based path for everything else; see [`crate::options`] for why both give
//! the same answers.

use std::{
  borrow::Cow,
  cmp::Ordering,
  hash::{
    BuildHasher,
    Hasher,
  },
  ops::Range,
};

use foldhash::fast::FixedState;
use the_core::{
  native::{
    char_to_native,
    native_to_char,
    native_to_unit,
  },
  scan,
  unicode::{
    self,
    NormalForm,
  },
};

use crate::{
  options::{
    Key,
    StringOptions,
    keys,
    matches_at,
  },
  value::{
    StringData,
    Text,
    clamp,
  },
};

const HASH_SEED: u64 = 0x4c69_7665_436f_6465;

impl<'a> Text<'a> {
  pub fn len(&self) -> usize {
    match self {
      Text::Native(bytes) => bytes.len(),
      Text::Unicode(units) => units.len(),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn units(&self) -> Cow<'a, [u16]> {
    match *self {
      Text::Native(bytes) => Cow::Owned(bytes.iter().map(|&b| native_to_unit(b)).collect()),
      Text::Unicode(units) => Cow::Borrowed(units),
    }
  }

  pub(crate) fn slice(&self, range: Range<usize>) -> Text<'a> {
    match *self {
      Text::Native(bytes) => Text::Native(&bytes[range]),
      Text::Unicode(units) => Text::Unicode(&units[range]),
    }
  }

  fn keys(&self, options: StringOptions) -> Vec<Key> {
    keys(&self.units(), options)
  }
}

/// Finds `needle` in `hay[within]`, returning absolute unit ranges.
pub(crate) fn find_text(
  hay: Text<'_>,
  within: Range<usize>,
  needle: Text<'_>,
  options: StringOptions,
  reverse: bool,
) -> Option<Range<usize>> {
  let within = clamp(within, hay.len());
  if needle.is_empty() {
    return None;
  }
  let base = within.start;
  match (hay.slice(within), needle) {
    (Text::Native(hay), Text::Native(needle)) => {
      let found = if reverse {
        scan::last_index_of(hay, needle, options.folding())
      } else {
        scan::first_index_of(hay, needle, options.folding())
      };
      found.map(|at| base + at..base + at + needle.len())
    },
    (hay, needle) => {
      let hay = hay.keys(options);
      let needle = needle.keys(options);
      let mut candidates = 0..hay.len();
      let at = if reverse {
        candidates.rfind(|&at| matches_at(&hay, at, &needle))
      } else {
        candidates.find(|&at| matches_at(&hay, at, &needle))
      }?;
      Some(base + hay[at].start..base + hay[at + needle.len() - 1].end)
    },
  }
}

/// A single character as a search needle, native when it can be.
pub(crate) struct CharNeedle {
  units: [u16; 2],
  len:   usize,
  byte:  Option<u8>,
}

impl CharNeedle {
  pub(crate) fn new(ch: char) -> Self {
    let mut units = [0u16; 2];
    let len = ch.encode_utf16(&mut units).len();
    Self {
      units,
      len,
      byte: char_to_native(ch),
    }
  }

  pub(crate) fn text(&self) -> Text<'_> {
    match &self.byte {
      Some(byte) => Text::Native(std::slice::from_ref(byte)),
      None => Text::Unicode(&self.units[..self.len]),
    }
  }
}

impl StringData {
  pub fn is_equal_to(&self, other: &StringData, options: StringOptions) -> bool {
    match (self.text(), other.text()) {
      (Text::Native(left), Text::Native(right)) => scan::equal(left, right, options.folding()),
      (left, right) => left
        .keys(options)
        .iter()
        .map(|key| key.ch)
        .eq(right.keys(options).iter().map(|key| key.ch)),
    }
  }

  /// Orders by the codepoints of the folded and normalized text.
  pub fn compare_to(&self, other: &StringData, options: StringOptions) -> Ordering {
    match (self.text(), other.text()) {
      (Text::Native(left), Text::Native(right)) => scan::compare(left, right, options.folding()),
      (left, right) => left
        .keys(options)
        .iter()
        .map(|key| key.ch)
        .cmp(right.keys(options).iter().map(|key| key.ch)),
    }
  }

  /// A hash that agrees with [`StringData::is_equal_to`] under the same
  /// options, stable across runs.
  pub fn hash_with(&self, options: StringOptions) -> u64 {
    let mut hasher = FixedState::with_seed(HASH_SEED).build_hasher();
    match self.text() {
      Text::Native(bytes) if !options.is_caseless() => {
        for &byte in bytes {
          hasher.write_u32(native_to_char(byte) as u32);
        }
      },
      // Caseless keys fold through Unicode, since a native character may
      // fold to one the codepage lacks.
      text => {
        for key in text.keys(options) {
          hasher.write_u32(key.ch as u32);
        }
      },
    }
    hasher.finish()
  }

  pub fn begins_with(&self, prefix: &StringData, options: StringOptions) -> bool {
    match (self.text(), prefix.text()) {
      (Text::Native(hay), Text::Native(prefix)) => {
        prefix.len() <= hay.len() && scan::equal(&hay[..prefix.len()], prefix, options.folding())
      },
      (hay, prefix) => {
        let prefix = prefix.keys(options);
        if prefix.is_empty() {
          return true;
        }
        matches_at(&hay.keys(options), 0, &prefix)
      },
    }
  }

  pub fn ends_with(&self, suffix: &StringData, options: StringOptions) -> bool {
    match (self.text(), suffix.text()) {
      (Text::Native(hay), Text::Native(suffix)) => {
        suffix.len() <= hay.len()
          && scan::equal(&hay[hay.len() - suffix.len()..], suffix, options.folding())
      },
      (hay, suffix) => {
        let suffix = suffix.keys(options);
        if suffix.is_empty() {
          return true;
        }
        let hay = hay.keys(options);
        hay.len() >= suffix.len() && matches_at(&hay, hay.len() - suffix.len(), &suffix)
      },
    }
  }

  /// Whether `needle` occurs anywhere. An empty needle never does.
  pub fn contains(&self, needle: &StringData, options: StringOptions) -> bool {
    self.find(needle, options).is_some()
  }

  /// The code units of the first match. With normalizing options these may
  /// differ in length from `needle`.
  pub fn find(&self, needle: &StringData, options: StringOptions) -> Option<Range<usize>> {
    self.find_in(0..self.len(), needle, options)
  }

  pub fn find_in(
    &self,
    within: Range<usize>,
    needle: &StringData,
    options: StringOptions,
  ) -> Option<Range<usize>> {
    find_text(self.text(), within, needle.text(), options, false)
  }

  pub fn rfind_in(
    &self,
    within: Range<usize>,
    needle: &StringData,
    options: StringOptions,
  ) -> Option<Range<usize>> {
    find_text(self.text(), within, needle.text(), options, true)
  }

  /// Offset of the first match starting at or after `after`.
  pub fn first_index_of(
    &self,
    needle: &StringData,
    after: usize,
    options: StringOptions,
  ) -> Option<usize> {
    self
      .find_in(after..self.len(), needle, options)
      .map(|found| found.start)
  }

  /// Offset of the last match ending at or before `before`.
  pub fn last_index_of(
    &self,
    needle: &StringData,
    before: usize,
    options: StringOptions,
  ) -> Option<usize> {
    self.rfind_in(0..before, needle, options).map(|found| found.start)
  }

  pub fn first_index_of_char(&self, ch: char, after: usize, options: StringOptions) -> Option<usize> {
    let needle = CharNeedle::new(ch);
    match (self.text(), needle.text()) {
      (Text::Native(hay), Text::Native([byte])) if after <= hay.len() => {
        scan::first_index_of_char(&hay[after..], *byte, options.folding()).map(|at| after + at)
      },
      (hay, needle) => find_text(hay, after..hay.len(), needle, options, false).map(|found| found.start),
    }
  }

  pub fn last_index_of_char(&self, ch: char, before: usize, options: StringOptions) -> Option<usize> {
    let needle = CharNeedle::new(ch);
    match (self.text(), needle.text()) {
      (Text::Native(hay), Text::Native([byte])) => {
        let before = before.min(hay.len());
        scan::last_index_of_char(&hay[..before], *byte, options.folding())
      },
      (hay, needle) => find_text(hay, 0..before, needle, options, true).map(|found| found.start),
    }
  }

  /// Non-overlapping occurrences of `needle`, scanning left to right.
  pub fn count(&self, needle: &StringData, options: StringOptions) -> usize {
    self.count_in(0..self.len(), needle, options)
  }

  pub fn count_in(&self, within: Range<usize>, needle: &StringData, options: StringOptions) -> usize {
    let within = clamp(within, self.len());
    match (self.text(), needle.text()) {
      (Text::Native(hay), Text::Native(needle)) => {
        scan::count(&hay[within], needle, options.folding())
      },
      _ => {
        let mut count = 0;
        let mut from = within.start;
        while let Some(found) = self.find_in(from..within.end, needle, options) {
          count += 1;
          from = found.end;
        }
        count
      },
    }
  }

  /// Code units at the start of `self` that match the start of `other`.
  pub fn shared_prefix(&self, other: &StringData, options: StringOptions) -> usize {
    match (self.text(), other.text()) {
      (Text::Native(left), Text::Native(right)) => scan::shared_prefix(left, right, options.folding()),
      (left, right) => {
        let left = left.keys(options);
        let right = right.keys(options);
        let mut shared = 0;
        for (l, r) in left.iter().zip(&right) {
          if l.ch != r.ch {
            break;
          }
          if l.last && r.last {
            shared = l.end;
          }
        }
        shared
      },
    }
  }

  /// Code units at the end of `self` that match the end of `other`.
  pub fn shared_suffix(&self, other: &StringData, options: StringOptions) -> usize {
    match (self.text(), other.text()) {
      (Text::Native(left), Text::Native(right)) => scan::shared_suffix(left, right, options.folding()),
      (left, right) => {
        let len = left.len();
        let left = left.keys(options);
        let right = right.keys(options);
        let mut shared = 0;
        for (l, r) in left.iter().rev().zip(right.iter().rev()) {
          if l.ch != r.ch {
            break;
          }
          if l.first && r.first {
            shared = len - l.start;
          }
        }
        shared
      },
    }
  }

  /// Glob-style match of the whole string against `pattern`.
  pub fn wildcard_match(&self, pattern: &StringData, options: StringOptions) -> bool {
    let service = unicode::service();
    let (mut text, mut pattern) = (self.to_string(), pattern.to_string());
    if options.is_normalizing() {
      text = service.normalize(&text, NormalForm::Nfc);
      pattern = service.normalize(&pattern, NormalForm::Nfc);
    }
    service.wildcard_match(&pattern, &text, options.is_caseless())
  }

  /// Locale-aware ordering for presentation, not for equality.
  pub fn compare_collated(&self, other: &StringData, locale: Option<&str>) -> Ordering {
    unicode::service().collate(&self.to_string(), &other.to_string(), locale)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::value::StringValue;

  const ALL: [StringOptions; 4] = [
    StringOptions::Exact,
    StringOptions::NonLiteral,
    StringOptions::Caseless,
    StringOptions::Folded,
  ];

  fn s(text: &str) -> StringValue {
    text.parse().unwrap()
  }

  fn wide(text: &str) -> StringValue {
    StringValue::from_chars(&text.encode_utf16().collect::<Vec<_>>()).unwrap()
  }

  quickcheck::quickcheck! {
    fn equality_is_symmetric(left: String, right: String) -> bool {
      let (left, right) = (s(&left), s(&right));
      ALL.iter().all(|&o| left.is_equal_to(&right, o) == right.is_equal_to(&left, o))
    }

    fn compare_agrees_with_equality(left: String, right: String) -> bool {
      let (left, right) = (s(&left), s(&right));
      ALL.iter().all(|&o| {
        (left.compare_to(&right, o) == Ordering::Equal) == left.is_equal_to(&right, o)
          && left.compare_to(&right, o) == right.compare_to(&left, o).reverse()
      })
    }

    fn native_and_wide_paths_agree(left: Vec<u8>, right: Vec<u8>) -> bool {
      let native_left = StringValue::from_native_chars(&left).unwrap();
      let native_right = StringValue::from_native_chars(&right).unwrap();
      let wide_left = StringValue::from_chars(&native_left.to_chars()).unwrap();
      let wide_right = StringValue::from_chars(&native_right.to_chars()).unwrap();
      ALL.iter().all(|&o| {
        native_left.is_equal_to(&native_right, o) == wide_left.is_equal_to(&wide_right, o)
          && native_left.compare_to(&native_right, o) == wide_left.compare_to(&wide_right, o)
          && native_left.find(&native_right, o) == wide_left.find(&wide_right, o)
          && native_left.count(&native_right, o) == wide_left.count(&wide_right, o)
          && native_left.hash_with(o) == wide_left.hash_with(o)
      })
    }

    fn equal_strings_hash_equal(text: String) -> bool {
      let upper = s(&text.to_uppercase());
      let lower = s(&text.to_lowercase());
      !upper.is_equal_to(&lower, StringOptions::Caseless)
        || upper.hash_with(StringOptions::Caseless) == lower.hash_with(StringOptions::Caseless)
    }
  }

  #[test]
  fn every_native_char_hashes_like_its_wide_form() {
    for byte in 1..=255u8 {
      let native = StringValue::from_native_chars(&[byte]).unwrap();
      let wide = StringValue::from_chars(&native.to_chars()).unwrap();
      for o in ALL {
        assert_eq!(native.hash_with(o), wide.hash_with(o), "{byte:#x} {o:?}");
      }
    }
  }

  #[test]
  fn empty_needle_is_never_found() {
    let hay = s("abc");
    let empty = StringValue::empty();
    for o in ALL {
      assert_eq!(hay.find(&empty, o), None);
      assert_eq!(hay.count(&empty, o), 0);
      assert!(!hay.contains(&empty, o));
      assert_eq!(wide("日本").find(&empty, o), None);
    }
  }

  #[test]
  fn caseless_mixed_encodings() {
    let hay = wide("Ünïcode Straße");
    assert_eq!(hay.find(&s("STRASSE"), StringOptions::Caseless), None);
    assert_eq!(hay.find(&s("straße"), StringOptions::Caseless), Some(8..14));
    assert_eq!(hay.find(&s("ÜNÏ"), StringOptions::Caseless), Some(0..3));
    assert!(hay.begins_with(&s("üni"), StringOptions::Caseless));
    assert!(!hay.begins_with(&s("üni"), StringOptions::Exact));
    assert!(!hay.ends_with(&s("SSE"), StringOptions::Caseless));
    assert!(!hay.ends_with(&s("ẞE"), StringOptions::Exact));
    assert!(hay.ends_with(&s("ßE"), StringOptions::Caseless));
  }

  #[test]
  fn normalizing_search_reports_source_units() {
    let hay = wide("cafe\u{301} noir");
    assert_eq!(hay.find(&s("café"), StringOptions::Exact), None);
    assert_eq!(hay.find(&s("café"), StringOptions::NonLiteral), Some(0..5));
    assert_eq!(hay.find(&s("CAFÉ"), StringOptions::Folded), Some(0..5));
    // A bare "e" does not match half of a grapheme.
    assert_eq!(hay.find(&s("cafe"), StringOptions::NonLiteral), None);
    assert!(hay.is_equal_to(&s("café noir"), StringOptions::NonLiteral));
    assert_eq!(
      hay.hash_with(StringOptions::Folded),
      s("CAFÉ NOIR").hash_with(StringOptions::Folded)
    );
  }

  #[test]
  fn index_of_variants() {
    let hay = s("a,b,c");
    assert_eq!(hay.first_index_of(&s(","), 2, StringOptions::Exact), Some(3));
    assert_eq!(hay.last_index_of(&s(","), 3, StringOptions::Exact), Some(1));
    assert_eq!(hay.first_index_of_char(',', 0, StringOptions::Exact), Some(1));
    assert_eq!(hay.last_index_of_char(',', 5, StringOptions::Exact), Some(3));
    assert_eq!(hay.first_index_of_char('B', 0, StringOptions::Caseless), Some(2));
    let wide_hay = wide("x😀y😀");
    assert_eq!(wide_hay.first_index_of_char('😀', 2, StringOptions::Exact), Some(4));
    assert_eq!(wide_hay.last_index_of_char('😀', 6, StringOptions::Exact), Some(4));
    assert_eq!(wide_hay.last_index_of_char('😀', 4, StringOptions::Exact), Some(1));
  }

  #[test]
  fn shared_prefix_and_suffix_in_units() {
    let left = wide("prefix😀");
    assert_eq!(left.shared_prefix(&s("PREfab"), StringOptions::Caseless), 4);
    assert_eq!(left.shared_suffix(&wide("ab😀"), StringOptions::Exact), 2);
    assert_eq!(wide("e\u{301}x").shared_prefix(&s("é"), StringOptions::NonLiteral), 2);
  }

  #[test]
  fn counting_is_non_overlapping() {
    assert_eq!(s("aaaa").count(&s("aa"), StringOptions::Exact), 2);
    assert_eq!(wide("ñaña").count(&s("Ñ"), StringOptions::Caseless), 2);
    assert_eq!(wide("ñaña").count_in(1..4, &s("ñ"), StringOptions::Exact), 1);
  }

  #[test]
  fn wildcards_and_collation() {
    assert!(s("report.TXT").wildcard_match(&s("*.txt"), StringOptions::Caseless));
    assert!(!s("report.TXT").wildcard_match(&s("*.txt"), StringOptions::Exact));
    assert_eq!(s("apple").compare_collated(&s("Banana"), None), Ordering::Less);
  }
}
