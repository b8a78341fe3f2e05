//! Find and replace, splitting, and delimiter navigation.

use std::ops::Range;

use indexmap::IndexMap;
use the_core::{
  native::char_to_native,
  scan,
};

use crate::{
  edit::Fragment,
  error::Result,
  options::{
    StringOptions,
    keys,
    matches_at,
  },
  value::{
    Flags,
    MutableString,
    StringData,
    StringValue,
    Text,
    Units,
    clamp,
  },
};

pub type SplitMap = IndexMap<StringValue, StringValue, foldhash::fast::RandomState>;

/// Where a needle sits among the delimited records of a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelimitedOffset {
  /// Delimiters between the start of the searched range and the match.
  pub index:  usize,
  pub found:  Range<usize>,
  /// Offset of the last delimiter before the match.
  pub before: Option<usize>,
  /// Offset of the first delimiter after the match, or the end of the range.
  pub after:  usize,
}

/// All non-overlapping matches of `needle` in `hay[within]`, left to right.
pub(crate) fn find_all(
  hay: Text<'_>,
  within: Range<usize>,
  needle: Text<'_>,
  options: StringOptions,
) -> Vec<Range<usize>> {
  let within = clamp(within, hay.len());
  let mut out = Vec::new();
  if needle.is_empty() {
    return out;
  }
  let base = within.start;
  match (hay.slice(within), needle) {
    (Text::Native(hay), Text::Native(needle)) => {
      let folding = options.folding();
      let mut from = 0;
      while let Some(at) = scan::first_index_of(&hay[from..], needle, folding) {
        let start = from + at;
        from = start + needle.len();
        out.push(base + start..base + from);
      }
    },
    (hay, needle) => {
      let hay = keys(&hay.units(), options);
      let needle = keys(&needle.units(), options);
      let mut at = 0;
      while at + needle.len() <= hay.len() {
        if matches_at(&hay, at, &needle) {
          out.push(base + hay[at].start..base + hay[at + needle.len() - 1].end);
          at += needle.len();
        } else {
          at += 1;
        }
      }
    },
  }
  out
}

impl<'a> From<Text<'a>> for Fragment<'a> {
  fn from(text: Text<'a>) -> Self {
    match text {
      Text::Native(bytes) => Fragment::Native(bytes),
      Text::Unicode(units) => Fragment::Chars(units),
    }
  }
}

fn push(out: &mut StringData, fragment: Fragment<'_>) -> Result<()> {
  let end = out.len();
  out.splice(end..end, fragment)
}

impl StringData {
  fn matches(&self, needle: &StringData, options: StringOptions) -> Vec<Range<usize>> {
    find_all(self.text(), 0..self.len(), needle.text(), options)
  }

  /// Ranges of the chunks between occurrences of `delimiter`. An empty
  /// string has no chunks and a trailing delimiter does not open one.
  pub fn break_into_chunks(&self, delimiter: &StringData, options: StringOptions) -> Vec<Range<usize>> {
    if self.is_empty() {
      return Vec::new();
    }
    let mut out = Vec::new();
    let mut start = 0;
    for found in self.matches(delimiter, options) {
      out.push(start..found.start);
      start = found.end;
    }
    if start < self.len() || out.is_empty() {
      out.push(start..self.len());
    }
    out
  }

  pub fn split(&self, delimiter: &StringData, options: StringOptions) -> Result<Vec<StringValue>> {
    self
      .break_into_chunks(delimiter, options)
      .into_iter()
      .map(|range| self.substring(range))
      .collect()
  }

  /// Splits into elements, then each element into a key and a value at the
  /// first `key_delimiter`. A repeated key takes the later value but keeps
  /// its first position.
  pub fn split_with_keys(
    &self,
    element_delimiter: &StringData,
    key_delimiter: &StringData,
    options: StringOptions,
  ) -> Result<SplitMap> {
    let mut map = SplitMap::default();
    for element in self.break_into_chunks(element_delimiter, options) {
      let (key, value) = match self.find_in(element.clone(), key_delimiter, options) {
        Some(found) => (
          self.substring(element.start..found.start)?,
          self.substring(found.end..element.end)?,
        ),
        None => (self.substring(element)?, StringValue::empty()),
      };
      map.insert(key, value);
    }
    Ok(map)
  }

  /// Head and tail around the first `separator`. Without one the whole string
  /// is the head.
  pub fn divide_at_char(
    &self,
    separator: char,
    options: StringOptions,
  ) -> Result<(StringValue, StringValue)> {
    match self.first_index_of_char(separator, 0, options) {
      Some(at) => {
        let width = separator.len_utf16();
        Ok((self.substring(0..at)?, self.substring(at + width..self.len())?))
      },
      None => Ok((self.substring(0..self.len())?, StringValue::empty())),
    }
  }

  /// Head before `at` and tail after it; the unit at `at` belongs to neither.
  pub fn divide_at_index(&self, at: usize) -> Result<(StringValue, StringValue)> {
    Ok((
      self.substring(0..at)?,
      self.substring(at.saturating_add(1)..self.len())?,
    ))
  }

  /// Finds `needle` in `range` after skipping `skip` delimiters and reports
  /// which record it falls in.
  pub fn delimited_offset(
    &self,
    range: Range<usize>,
    needle: &StringData,
    delimiter: &StringData,
    skip: usize,
    options: StringOptions,
  ) -> Option<DelimitedOffset> {
    if needle.is_empty() {
      return None;
    }
    let range = clamp(range, self.len());
    let delimiters = find_all(self.text(), range.clone(), delimiter.text(), options);
    let from = match skip {
      0 => range.start,
      _ => delimiters.get(skip - 1)?.end,
    };
    let found = self.find_in(from..range.end, needle, options)?;
    let index = delimiters.partition_point(|d| d.end <= found.start);
    let before = index.checked_sub(1).map(|idx| delimiters[idx].start);
    let after = delimiters[index..]
      .iter()
      .find(|d| d.start >= found.end)
      .map_or(range.end, |d| d.start);
    Some(DelimitedOffset {
      index,
      found,
      before,
      after,
    })
  }

  /// The record that starts after `skip` delimiters from the start of
  /// `range`, without its delimiters.
  pub fn forward_delimited_region(
    &self,
    range: Range<usize>,
    delimiter: &StringData,
    skip: usize,
    options: StringOptions,
  ) -> Option<Range<usize>> {
    let range = clamp(range, self.len());
    let mut start = range.start;
    for _ in 0..skip {
      start = self.find_in(start..range.end, delimiter, options)?.end;
    }
    let end = self
      .find_in(start..range.end, delimiter, options)
      .map_or(range.end, |found| found.start);
    Some(start..end)
  }
}

impl MutableString {
  /// Replaces every non-overlapping match of `pattern`, returning how many
  /// were replaced.
  pub fn find_and_replace(
    &mut self,
    pattern: &StringData,
    replacement: &StringData,
    options: StringOptions,
  ) -> Result<usize> {
    let found = self.matches(pattern, options);
    if found.is_empty() {
      return Ok(0);
    }
    let mut out = StringData::empty();
    if !self.is_native() {
      out.unnativize()?;
    }
    let text = self.text();
    let mut last = 0;
    for range in &found {
      push(&mut out, text.slice(last..range.start).into())?;
      push(&mut out, Fragment::of(replacement))?;
      last = range.end;
    }
    push(&mut out, text.slice(last..text.len()).into())?;
    *self.data_mut()? = out;
    Ok(found.len())
  }

  pub fn find_and_replace_char(
    &mut self,
    pattern: char,
    replacement: char,
    options: StringOptions,
  ) -> Result<usize> {
    if options == StringOptions::Exact && pattern.len_utf16() == 1 && replacement.len_utf16() == 1 {
      if let Some(count) = self.replace_unit_in_place(pattern, replacement)? {
        return Ok(count);
      }
    }
    let pattern: StringValue = pattern.encode_utf8(&mut [0; 4]).parse()?;
    let replacement: StringValue = replacement.encode_utf8(&mut [0; 4]).parse()?;
    self.find_and_replace(&pattern, &replacement, options)
  }

  fn replace_unit_in_place(&mut self, pattern: char, replacement: char) -> Result<Option<usize>> {
    let (from, to) = (pattern as u32 as u16, replacement as u32 as u16);
    let native = (char_to_native(pattern), char_to_native(replacement));
    let occurrences = match (self.text(), native) {
      (Text::Native(_), (None, _)) => return Ok(Some(0)),
      (Text::Native(_), (Some(_), None)) => return Ok(None),
      (Text::Native(bytes), (Some(from), _)) => bytes.iter().filter(|&&b| b == from).count(),
      (Text::Unicode(units), _) => units.iter().filter(|&&u| u == from).count(),
    };
    if occurrences == 0 {
      return Ok(Some(0));
    }
    let data = self.data_mut()?;
    data.number.set(None);
    match (&mut data.units, native) {
      (Units::Native(buffer), (Some(from), Some(to))) => {
        for byte in buffer.as_mut_slice().iter_mut().filter(|b| **b == from) {
          *byte = to;
        }
      },
      (Units::Unicode(buffer), _) => {
        for unit in buffer.as_mut_slice().iter_mut().filter(|u| **u == from) {
          *unit = to;
        }
        data.flags.set(Flags::UNCHECKED);
      },
      _ => unreachable!("non-native replacements were routed above"),
    }
    Ok(Some(occurrences))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn s(text: &str) -> StringValue {
    text.parse().unwrap()
  }

  fn wide(text: &str) -> StringValue {
    StringValue::from_chars(&text.encode_utf16().collect::<Vec<_>>()).unwrap()
  }

  fn strings(values: &[StringValue]) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
  }

  quickcheck::quickcheck! {
    fn split_then_join_round_trips(parts: Vec<String>) -> bool {
      let parts: Vec<String> = parts.into_iter().map(|p| p.replace(';', "")).collect();
      let joined = parts.join(";");
      let source = s(&joined);
      let split = source.split(&s(";"), StringOptions::Exact).unwrap();
      let mut rejoined = strings(&split).join(";");
      if joined.ends_with(';') {
        rejoined.push(';');
      }
      rejoined == joined
    }

    fn replace_agrees_across_encodings(text: String) -> bool {
      let mut native = s(&text).mutable_copy();
      let mut unicode = wide(&text).mutable_copy();
      let a = native.find_and_replace(&s("a"), &s("<>"), StringOptions::Caseless).unwrap();
      let b = unicode.find_and_replace(&s("a"), &s("<>"), StringOptions::Caseless).unwrap();
      a == b && native.to_string() == unicode.to_string()
    }
  }

  #[test]
  fn replace_is_idempotent_once_pattern_is_gone() {
    let mut text = s("aXbXc").mutable_copy();
    assert_eq!(text.find_and_replace(&s("X"), &s("-"), StringOptions::Exact).unwrap(), 2);
    assert_eq!(text.to_string(), "a-b-c");
    assert_eq!(text.find_and_replace(&s("X"), &s("-"), StringOptions::Exact).unwrap(), 0);
    assert_eq!(text.to_string(), "a-b-c");
  }

  #[test]
  fn replace_matches_do_not_overlap() {
    let mut text = s("aaaa").mutable_copy();
    text.find_and_replace(&s("aa"), &s("b"), StringOptions::Exact).unwrap();
    assert_eq!(text.to_string(), "bb");
    let mut text = s("ABab").mutable_copy();
    text.find_and_replace(&s("ab"), &s(""), StringOptions::Caseless).unwrap();
    assert!(text.is_empty());
  }

  #[test]
  fn replace_keeps_wide_strings_wide() {
    let mut text = wide("x–y").mutable_copy();
    text.find_and_replace(&wide("–"), &s("-"), StringOptions::Exact).unwrap();
    assert_eq!(text.to_string(), "x-y");
    assert!(!text.is_native());
    assert!(text.can_be_native());
  }

  #[test]
  fn replace_normalized_match_of_different_length() {
    let mut text = wide("cafe\u{301}!").mutable_copy();
    let count = text
      .find_and_replace(&s("é"), &s("E"), StringOptions::NonLiteral)
      .unwrap();
    assert_eq!(count, 1);
    assert_eq!(text.to_string(), "cafE!");
  }

  #[test]
  fn char_replacement() {
    let mut text = s("a.b.c").mutable_copy();
    assert_eq!(text.find_and_replace_char('.', '/', StringOptions::Exact).unwrap(), 2);
    assert_eq!(text.to_string(), "a/b/c");
    assert!(text.is_native());

    assert_eq!(text.find_and_replace_char('/', 'Ω', StringOptions::Exact).unwrap(), 2);
    assert_eq!(text.to_string(), "aΩbΩc");
    assert!(!text.is_native());

    assert_eq!(text.find_and_replace_char('Ω', ';', StringOptions::Exact).unwrap(), 2);
    assert_eq!(text.to_string(), "a;b;c");
    assert!(text.can_be_native());

    assert_eq!(text.find_and_replace_char('B', 'x', StringOptions::Caseless).unwrap(), 1);
    assert_eq!(text.to_string(), "a;x;c");
  }

  #[test]
  fn split_edges() {
    let delimiter = s(",");
    assert!(s("").split(&delimiter, StringOptions::Exact).unwrap().is_empty());
    assert_eq!(strings(&s("a,b").split(&s(""), StringOptions::Exact).unwrap()), ["a,b"]);
    assert_eq!(strings(&s("a,b,").split(&delimiter, StringOptions::Exact).unwrap()), ["a", "b"]);
    assert_eq!(strings(&s("a,,").split(&delimiter, StringOptions::Exact).unwrap()), ["a", ""]);
    assert_eq!(strings(&s(",").split(&delimiter, StringOptions::Exact).unwrap()), [""]);
    assert_eq!(strings(&s("xAyaz").split(&s("a"), StringOptions::Caseless).unwrap()), ["x", "y", "z"]);
  }

  #[test]
  fn split_with_keys_builds_ordered_map() {
    let map = s("k1=v1;k2=v2").split_with_keys(&s(";"), &s("="), StringOptions::Exact).unwrap();
    let pairs: Vec<(String, String)> = map.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    assert_eq!(pairs, [("k1".into(), "v1".into()), ("k2".into(), "v2".into())]);

    let map = s("b=1;a;b=2=3").split_with_keys(&s(";"), &s("="), StringOptions::Exact).unwrap();
    let pairs: Vec<(String, String)> = map.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    assert_eq!(pairs, [("b".into(), "2=3".into()), ("a".into(), String::new())]);
  }

  #[test]
  fn divide() {
    let (head, tail) = s("host:8080").divide_at_char(':', StringOptions::Exact).unwrap();
    assert_eq!((head.to_string(), tail.to_string()), ("host".into(), "8080".into()));
    let (head, tail) = s("host").divide_at_char(':', StringOptions::Exact).unwrap();
    assert_eq!((head.to_string(), tail.to_string()), ("host".into(), String::new()));
    let (head, tail) = s("ab=cd").divide_at_index(2).unwrap();
    assert_eq!((head.to_string(), tail.to_string()), ("ab".into(), "cd".into()));
  }

  #[test]
  fn delimited_offset_reports_record() {
    let text = s("one\ntwo\nthree\nfour");
    let offset = text
      .delimited_offset(0..text.len(), &s("ee"), &s("\n"), 0, StringOptions::Exact)
      .unwrap();
    assert_eq!(offset.index, 2);
    assert_eq!(offset.found, 11..13);
    assert_eq!(offset.before, Some(7));
    assert_eq!(offset.after, 13);

    let skipped = text
      .delimited_offset(0..text.len(), &s("o"), &s("\n"), 2, StringOptions::Exact)
      .unwrap();
    assert_eq!(skipped.index, 3);
    assert_eq!(skipped.found, 15..16);
    assert_eq!(skipped.after, text.len());

    assert!(text.delimited_offset(0..text.len(), &s("o"), &s("\n"), 9, StringOptions::Exact).is_none());
    assert!(text.delimited_offset(0..text.len(), &s(""), &s("\n"), 0, StringOptions::Exact).is_none());
  }

  #[test]
  fn forward_region() {
    let text = s("a,bb,ccc");
    let comma = s(",");
    assert_eq!(text.forward_delimited_region(0..8, &comma, 0, StringOptions::Exact), Some(0..1));
    assert_eq!(text.forward_delimited_region(0..8, &comma, 1, StringOptions::Exact), Some(2..4));
    assert_eq!(text.forward_delimited_region(0..8, &comma, 2, StringOptions::Exact), Some(5..8));
    assert_eq!(text.forward_delimited_region(0..8, &comma, 3, StringOptions::Exact), None);
  }

  #[test]
  fn chunk_ranges() {
    assert_eq!(s("a\nb\n").break_into_chunks(&s("\n"), StringOptions::Exact), [0..1, 2..3]);
    assert_eq!(s("\n").break_into_chunks(&s("\n"), StringOptions::Exact), [0..0]);
    assert!(s("").break_into_chunks(&s("\n"), StringOptions::Exact).is_empty());
  }
}
