//! The Unicode service contract and its default implementation.
//!
//! The string engine never implements segmentation, normalization or case
//! mapping itself; it asks the process-wide [`UnicodeService`]. A host can
//! install its own implementation once, before first use, with
//! [`install_service`]; otherwise [`StdUnicode`] is used.
//!
//! Surrogate handling lives here as free functions since it is plain
//! arithmetic and never worth swapping out.

use std::cmp::Ordering;

use globset::GlobBuilder;
use once_cell::sync::OnceCell;
use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NormalForm {
  Nfc,
  Nfd,
  Nfkc,
  Nfkd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaseMapping {
  Lower,
  Upper,
  Fold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BreakKind {
  Grapheme,
  Word,
  Sentence,
}

pub trait UnicodeService: Send + Sync {
  /// Byte offsets of every boundary of `kind` in `text`, including `0` and
  /// `text.len()`. An empty text has the single boundary `0`.
  fn boundaries(&self, text: &str, kind: BreakKind) -> Vec<usize>;

  fn is_grapheme_boundary(&self, left: char, right: char) -> bool {
    let mut pair = String::with_capacity(8);
    pair.push(left);
    pair.push(right);
    self
      .boundaries(&pair, BreakKind::Grapheme)
      .contains(&left.len_utf8())
  }

  fn normalize(&self, text: &str, form: NormalForm) -> String;

  fn case_map(&self, text: &str, mapping: CaseMapping, locale: Option<&str>) -> String;

  fn is_alphabetic(&self, ch: char) -> bool;

  fn is_digit(&self, ch: char) -> bool;

  fn is_word_part(&self, ch: char) -> bool {
    self.is_alphabetic(ch) || self.is_digit(ch)
  }

  fn collate(&self, left: &str, right: &str, locale: Option<&str>) -> Ordering;

  fn wildcard_match(&self, pattern: &str, text: &str, caseless: bool) -> bool;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct StdUnicode;

fn is_turkic(locale: Option<&str>) -> bool {
  locale.is_some_and(|l| l.starts_with("tr") || l.starts_with("az"))
}

impl UnicodeService for StdUnicode {
  fn boundaries(&self, text: &str, kind: BreakKind) -> Vec<usize> {
    let mut out = Vec::with_capacity(text.len() + 1);
    match kind {
      BreakKind::Grapheme => {
        for (idx, grapheme) in text.grapheme_indices(true) {
          out.push(idx);
          // CR LF stays two characters.
          if grapheme == "\r\n" {
            out.push(idx + 1);
          }
        }
      },
      BreakKind::Word => out.extend(text.split_word_bound_indices().map(|(idx, _)| idx)),
      BreakKind::Sentence => out.extend(text.split_sentence_bound_indices().map(|(idx, _)| idx)),
    }
    if out.first() != Some(&0) {
      out.insert(0, 0);
    }
    if !text.is_empty() {
      out.push(text.len());
    }
    out
  }

  fn normalize(&self, text: &str, form: NormalForm) -> String {
    match form {
      NormalForm::Nfc => text.nfc().collect(),
      NormalForm::Nfd => text.nfd().collect(),
      NormalForm::Nfkc => text.nfkc().collect(),
      NormalForm::Nfkd => text.nfkd().collect(),
    }
  }

  fn case_map(&self, text: &str, mapping: CaseMapping, locale: Option<&str>) -> String {
    match mapping {
      CaseMapping::Lower if is_turkic(locale) => text
        .chars()
        .map(|c| match c {
          'I' => "ı".to_string(),
          'İ' => "i".to_string(),
          c => c.to_lowercase().collect(),
        })
        .collect(),
      CaseMapping::Upper if is_turkic(locale) => text
        .chars()
        .map(|c| match c {
          'i' => "İ".to_string(),
          c => c.to_uppercase().collect(),
        })
        .collect(),
      CaseMapping::Lower => text.to_lowercase(),
      CaseMapping::Upper => text.to_uppercase(),
      CaseMapping::Fold => text.chars().map(fold_char).collect(),
    }
  }

  fn is_alphabetic(&self, ch: char) -> bool {
    ch.is_alphabetic()
  }

  fn is_digit(&self, ch: char) -> bool {
    ch.is_numeric()
  }

  fn collate(&self, left: &str, right: &str, locale: Option<&str>) -> Ordering {
    let key = |s: &str| -> String {
      self
        .case_map(s, CaseMapping::Fold, locale)
        .nfd()
        .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
        .collect()
    };
    key(left).cmp(&key(right)).then_with(|| left.cmp(right))
  }

  fn wildcard_match(&self, pattern: &str, text: &str, caseless: bool) -> bool {
    match GlobBuilder::new(pattern)
      .case_insensitive(caseless)
      .literal_separator(false)
      .backslash_escape(true)
      .build()
    {
      Ok(glob) => glob.compile_matcher().is_match(text),
      Err(err) => {
        tracing::debug!(%err, pattern, "invalid wildcard pattern");
        false
      },
    }
  }
}

static SERVICE: OnceCell<Box<dyn UnicodeService>> = OnceCell::new();

/// The installed Unicode service, defaulting to [`StdUnicode`].
pub fn service() -> &'static dyn UnicodeService {
  SERVICE.get_or_init(|| Box::new(StdUnicode)).as_ref()
}

/// Installs `service` for the whole process. Fails, handing the service back,
/// once any service has been installed or used.
pub fn install_service(
  service: Box<dyn UnicodeService>,
) -> Result<(), Box<dyn UnicodeService>> {
  SERVICE.set(service)
}

/// Simple case folding of a single character.
#[inline]
pub fn fold_char(ch: char) -> char {
  if ch.is_ascii() {
    return ch.to_ascii_lowercase();
  }
  let mut lower = ch.to_lowercase();
  match (lower.next(), lower.next()) {
    (Some(folded), None) => folded,
    _ => ch,
  }
}

#[inline]
pub const fn is_lead_surrogate(unit: u16) -> bool {
  matches!(unit, 0xD800..=0xDBFF)
}

#[inline]
pub const fn is_trail_surrogate(unit: u16) -> bool {
  matches!(unit, 0xDC00..=0xDFFF)
}

#[inline]
pub const fn is_surrogate(unit: u16) -> bool {
  matches!(unit, 0xD800..=0xDFFF)
}

#[inline]
pub const fn surrogates_to_codepoint(lead: u16, trail: u16) -> u32 {
  0x10000 + (((lead as u32) - 0xD800) << 10) + ((trail as u32) - 0xDC00)
}

/// Splits a supplementary-plane codepoint into its surrogate pair.
#[inline]
pub const fn codepoint_to_surrogates(codepoint: u32) -> (u16, u16) {
  let offset = codepoint - 0x10000;
  (
    (0xD800 + (offset >> 10)) as u16,
    (0xDC00 + (offset & 0x3FF)) as u16,
  )
}

#[inline]
pub const fn codepoint_unit_count(codepoint: u32) -> usize {
  if codepoint >= 0x10000 { 2 } else { 1 }
}

/// Decodes the codepoint starting at `idx`, returning it with its width in
/// code units. Unpaired surrogates decode as U+FFFD, one unit wide.
#[inline]
pub fn decode_at(units: &[u16], idx: usize) -> (char, usize) {
  let unit = units[idx];
  if is_lead_surrogate(unit) {
    if let Some(&trail) = units.get(idx + 1) {
      if is_trail_surrogate(trail) {
        let cp = surrogates_to_codepoint(unit, trail);
        return (char::from_u32(cp).unwrap_or(char::REPLACEMENT_CHARACTER), 2);
      }
    }
  }
  (
    char::from_u32(unit as u32).unwrap_or(char::REPLACEMENT_CHARACTER),
    1,
  )
}

/// Iterates `(unit offset, char, unit width)` over UTF-16 units.
pub fn codepoints(units: &[u16]) -> impl Iterator<Item = (usize, char, usize)> + '_ {
  let mut idx = 0;
  std::iter::from_fn(move || {
    if idx >= units.len() {
      return None;
    }
    let (ch, width) = decode_at(units, idx);
    let at = idx;
    idx += width;
    Some((at, ch, width))
  })
}

pub fn encode_char(ch: char, out: &mut Vec<u16>) {
  let mut buf = [0u16; 2];
  out.extend_from_slice(ch.encode_utf16(&mut buf));
}

/// Text transcoded to UTF-8 for the segmentation service, remembering where
/// every character started in the original code unit space.
pub struct Transcoded {
  text:     String,
  /// Code unit offset of each char boundary, indexed by byte offset.
  units_at: Vec<usize>,
}

impl Transcoded {
  pub fn from_units(units: &[u16]) -> Self {
    Self::from_chars(codepoints(units).map(|(_, ch, width)| (ch, width)))
  }

  pub fn from_chars(chars: impl Iterator<Item = (char, usize)>) -> Self {
    let mut text = String::new();
    let mut units_at = Vec::new();
    let mut unit = 0;
    for (ch, width) in chars {
      let len = ch.len_utf8();
      units_at.push(unit);
      units_at.extend(std::iter::repeat_n(unit, len - 1));
      text.push(ch);
      unit += width;
    }
    units_at.push(unit);
    Self { text, units_at }
  }

  pub fn as_str(&self) -> &str {
    &self.text
  }

  pub fn unit_offset(&self, byte: usize) -> usize {
    self.units_at[byte.min(self.units_at.len() - 1)]
  }

  /// Boundaries of `kind` as code unit offsets.
  pub fn boundaries(&self, kind: BreakKind) -> Vec<usize> {
    service()
      .boundaries(&self.text, kind)
      .into_iter()
      .map(|byte| self.unit_offset(byte))
      .collect()
  }
}
