//! In-place editing of [`MutableString`].
//!
//! Every edit funnels into one splice. A native string stays native as long
//! as the incoming code units all have native bytes; the first unit that does
//! not makes the string UTF-16 for good (until an explicit
//! [`MutableString::nativize`]) and the edit is retried once in that form.
//! Content flags are carried across inserts by merging them with the flags
//! of the inserted text and checking the two seams; removals simply mark the
//! flags for recomputation.

use std::ops::Range;

use smallvec::SmallVec;
use the_core::{
  native::{
    self,
    char_to_native,
    native_to_unit,
    unit_to_native,
  },
  unicode::{
    self,
    CaseMapping,
    NormalForm,
  },
};

use crate::{
  buffer::Buffer,
  convert::native_lossy,
  error::{
    Result,
    StringError,
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

/// Content handed to a splice.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Fragment<'a> {
  Native(&'a [u8]),
  /// Raw UTF-16 units that should stay native where possible.
  Chars(&'a [u16]),
  /// The units of a UTF-16 string, with its flags.
  Unicode(&'a [u16], Flags),
}

impl<'a> Fragment<'a> {
  pub(crate) fn of(data: &'a StringData) -> Self {
    match data.text() {
      Text::Native(bytes) => Fragment::Native(bytes),
      Text::Unicode(units) => Fragment::Unicode(units, data.flags()),
    }
  }
}

fn seam_is_boundary(units: &[u16], at: usize) -> bool {
  if at == 0 || at >= units.len() {
    return true;
  }
  let ch = |unit: u16| char::from_u32(unit as u32).unwrap_or(char::REPLACEMENT_CHARACTER);
  unicode::service().is_grapheme_boundary(ch(units[at - 1]), ch(units[at]))
}

impl StringData {
  pub(crate) fn splice(&mut self, range: Range<usize>, fragment: Fragment<'_>) -> Result<()> {
    let range = clamp(range, self.len());
    self.number.set(None);
    if let Units::Native(buffer) = &mut self.units {
      match fragment {
        Fragment::Native(bytes) => return buffer.splice(range, bytes),
        Fragment::Chars(chars) => {
          let mapped: Option<SmallVec<[u8; 64]>> =
            chars.iter().map(|&unit| unit_to_native(unit)).collect();
          if let Some(bytes) = mapped {
            return buffer.splice(range, &bytes);
          }
        },
        Fragment::Unicode(..) => {},
      }
      tracing::trace!(len = buffer.len(), "unnativizing to accept non-native content");
    }
    self.unnativize()?;

    let widened: Vec<u16>;
    let (units, incoming) = match fragment {
      Fragment::Native(bytes) => {
        widened = bytes.iter().map(|&b| native_to_unit(b)).collect();
        (widened.as_slice(), Flags::NATIVE)
      },
      Fragment::Chars(chars) => (chars, Flags::compute(chars)),
      Fragment::Unicode(chars, flags) => (chars, flags),
    };
    let Units::Unicode(buffer) = &mut self.units else {
      unreachable!("string was unnativized above");
    };
    let mut flags = if range.is_empty() {
      self.flags.get().merged(incoming)
    } else {
      Flags::UNCHECKED
    };
    buffer.splice(range.clone(), units)?;
    if flags.trivial && !units.is_empty() {
      let text = buffer.as_slice();
      if !seam_is_boundary(text, range.start) || !seam_is_boundary(text, range.start + units.len()) {
        flags.trivial = false;
      }
    }
    self.flags.set(flags);
    Ok(())
  }

  pub(crate) fn unnativize(&mut self) -> Result<()> {
    if let Units::Native(buffer) = &self.units {
      let wide = Buffer::from_iter_exact(
        buffer.len(),
        buffer.as_slice().iter().map(|&b| native_to_unit(b)),
      )?;
      self.units = Units::Unicode(wide);
      self.flags.set(Flags::NATIVE);
    }
    Ok(())
  }

  pub(crate) fn nativize(&mut self) -> Result<()> {
    if let Units::Unicode(buffer) = &self.units {
      let bytes = native_lossy(buffer.as_slice());
      self.units = Units::Native(Buffer::from_slice(&bytes)?);
      self.flags.set(Flags::NATIVE);
    }
    Ok(())
  }

  /// Replaces the whole content with `text`, keeping native strings native
  /// when the new content allows it.
  fn rebuild(&mut self, text: &str) -> Result<()> {
    let units: Vec<u16> = text.encode_utf16().collect();
    let mut fresh = StringData::unicode(Buffer::from_slice(&units)?, Flags::UNCHECKED);
    if self.is_native() && fresh.can_be_native() {
      fresh.nativize()?;
    }
    *self = fresh;
    Ok(())
  }

  /// A normalized copy.
  pub fn normalized(&self, form: NormalForm) -> Result<StringValue> {
    let mut copy = MutableString::new();
    copy.append(self)?;
    copy.normalize(form)?;
    Ok(copy.into_value())
  }
}

fn is_default_locale(locale: Option<&str>) -> bool {
  !locale.is_some_and(|l| l.starts_with("tr") || l.starts_with("az"))
}

impl MutableString {
  fn edit(&mut self, range: Range<usize>, fragment: Fragment<'_>) -> Result<()> {
    self.data_mut()?.splice(range, fragment)
  }

  pub fn append(&mut self, other: &StringData) -> Result<()> {
    let end = self.len();
    self.edit(end..end, Fragment::of(other))
  }

  pub fn append_native_chars(&mut self, chars: &[u8]) -> Result<()> {
    let end = self.len();
    self.edit(end..end, Fragment::Native(chars))
  }

  pub fn append_chars(&mut self, chars: &[u16]) -> Result<()> {
    let end = self.len();
    self.edit(end..end, Fragment::Chars(chars))
  }

  pub fn append_char(&mut self, ch: char) -> Result<()> {
    let mut units = [0u16; 2];
    self.append_chars(ch.encode_utf16(&mut units))
  }

  pub fn append_str(&mut self, text: &str) -> Result<()> {
    let native: Option<Vec<u8>> = text.chars().map(char_to_native).collect();
    match native {
      Some(bytes) => self.append_native_chars(&bytes),
      None => self.append_chars(&text.encode_utf16().collect::<Vec<_>>()),
    }
  }

  /// Appends a copy of the string to itself.
  pub fn append_self(&mut self) -> Result<()> {
    let copy = self.substring(0..self.len())?;
    self.append(&copy)
  }

  pub fn prepend(&mut self, other: &StringData) -> Result<()> {
    self.edit(0..0, Fragment::of(other))
  }

  pub fn prepend_native_chars(&mut self, chars: &[u8]) -> Result<()> {
    self.edit(0..0, Fragment::Native(chars))
  }

  pub fn prepend_chars(&mut self, chars: &[u16]) -> Result<()> {
    self.edit(0..0, Fragment::Chars(chars))
  }

  pub fn insert(&mut self, at: usize, other: &StringData) -> Result<()> {
    self.edit(at..at, Fragment::of(other))
  }

  pub fn insert_native_chars(&mut self, at: usize, chars: &[u8]) -> Result<()> {
    self.edit(at..at, Fragment::Native(chars))
  }

  pub fn insert_chars(&mut self, at: usize, chars: &[u16]) -> Result<()> {
    self.edit(at..at, Fragment::Chars(chars))
  }

  pub fn replace(&mut self, range: Range<usize>, other: &StringData) -> Result<()> {
    self.edit(range, Fragment::of(other))
  }

  pub fn replace_native_chars(&mut self, range: Range<usize>, chars: &[u8]) -> Result<()> {
    self.edit(range, Fragment::Native(chars))
  }

  pub fn replace_chars(&mut self, range: Range<usize>, chars: &[u16]) -> Result<()> {
    self.edit(range, Fragment::Chars(chars))
  }

  pub fn remove(&mut self, range: Range<usize>) -> Result<()> {
    if clamp(range.clone(), self.len()).is_empty() {
      return Ok(());
    }
    self.edit(range, Fragment::Native(&[]))
  }

  /// Keeps only the units in `range`.
  pub fn keep_range(&mut self, range: Range<usize>) -> Result<()> {
    let range = clamp(range, self.len());
    let len = self.len();
    self.remove(range.end..len)?;
    self.remove(0..range.start)
  }

  /// Inserts `count` copies of `with` at `at`.
  pub fn pad(&mut self, at: usize, count: usize, with: &StringData) -> Result<()> {
    let requested = with.len().checked_mul(count).ok_or(StringError::Overflow {
      requested: usize::MAX,
    })?;
    if requested == 0 {
      return Ok(());
    }
    match with.text() {
      Text::Native(bytes) => self.edit(at..at, Fragment::Native(&bytes.repeat(count))),
      Text::Unicode(units) => {
        self.edit(at..at, Fragment::Unicode(&units.repeat(count), with.flags()))
      },
    }
  }

  /// Converts to the native encoding. Graphemes without a native form
  /// become `?`.
  pub fn nativize(&mut self) -> Result<()> {
    if self.is_native() {
      return Ok(());
    }
    self.data_mut()?.nativize()
  }

  pub fn unnativize(&mut self) -> Result<()> {
    if !self.is_native() {
      return Ok(());
    }
    self.data_mut()?.unnativize()
  }

  pub fn lowercase(&mut self, locale: Option<&str>) -> Result<()> {
    self.map_case(CaseMapping::Lower, locale)
  }

  pub fn uppercase(&mut self, locale: Option<&str>) -> Result<()> {
    self.map_case(CaseMapping::Upper, locale)
  }

  /// Case folds for caseless comparison.
  pub fn fold(&mut self) -> Result<()> {
    self.map_case(CaseMapping::Fold, None)
  }

  fn map_case(&mut self, mapping: CaseMapping, locale: Option<&str>) -> Result<()> {
    let data = self.data_mut()?;
    data.number.set(None);
    if let Units::Native(buffer) = &mut data.units {
      if is_default_locale(locale) {
        match mapping {
          CaseMapping::Lower | CaseMapping::Fold => native::lowercase_bytes(buffer.as_mut_slice()),
          CaseMapping::Upper => native::uppercase_bytes(buffer.as_mut_slice()),
        }
        return Ok(());
      }
    }
    let mapped = unicode::service().case_map(&data.to_string(), mapping, locale);
    data.rebuild(&mapped)
  }

  pub fn normalize(&mut self, form: NormalForm) -> Result<()> {
    // Native text is already composed.
    if self.is_native() && form == NormalForm::Nfc {
      return Ok(());
    }
    let data = self.data_mut()?;
    let normal = unicode::service().normalize(&data.to_string(), form);
    data.rebuild(&normal)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn utf16(s: &str) -> Vec<u16> {
    s.encode_utf16().collect()
  }

  fn native(s: &str) -> StringValue {
    let value: StringValue = s.parse().unwrap();
    assert!(value.is_native());
    value
  }

  quickcheck::quickcheck! {
    fn unnativize_then_nativize_is_identity(bytes: Vec<u8>) -> bool {
      let mut s = StringValue::from_native_chars(&bytes).unwrap().mutable_copy();
      s.unnativize().unwrap();
      let widened = s.is_empty() || !s.is_native();
      s.nativize().unwrap();
      widened && s.native_chars() == Some(bytes.as_slice())
    }

    fn native_inserts_keep_can_be_native(prefix: String, inserts: Vec<(u8, Vec<u8>)>) -> bool {
      let mut s = MutableString::new();
      s.append_str(&prefix).unwrap();
      let before = s.can_be_native();
      for (at, bytes) in inserts {
        let at = at as usize % (s.len() + 1);
        s.insert_native_chars(at, &bytes).unwrap();
        let wide: Vec<u16> = bytes.iter().map(|&b| native_to_unit(b)).collect();
        s.append_chars(&wide).unwrap();
      }
      !before || s.can_be_native()
    }

    fn incremental_flags_match_recomputed(parts: Vec<String>) -> bool {
      let mut s = MutableString::new();
      s.append_chars(&utf16("\u{3b1}")).unwrap();
      for part in &parts {
        s.append_chars(&utf16(part)).unwrap();
      }
      let incremental = s.flags();
      let recomputed = Flags::compute(&s.chars());
      incremental == recomputed || !incremental.checked
    }
  }

  #[test]
  fn appending_a_wide_string_leaves_native_behind() {
    let mut s = native("hello").mutable_copy();
    let e_acute = StringValue::from_chars(&utf16("é")).unwrap();
    s.append(&e_acute).unwrap();
    assert!(!s.is_native());
    assert_eq!(s.len(), 6);
    assert_eq!(s.char_at(5), Some(0xE9));
    assert_eq!(s.to_string(), "helloé");
    assert!(s.can_be_native());
    s.nativize().unwrap();
    assert!(s.is_native());
    assert_eq!(s.to_string(), "helloé");
  }

  #[test]
  fn raw_chars_stay_native_when_they_can() {
    let mut s = MutableString::new();
    s.append_chars(&utf16("café")).unwrap();
    assert!(s.is_native());
    s.append_char('😀').unwrap();
    assert!(!s.is_native());
    assert!(!s.is_basic());
    assert_eq!(s.to_string(), "café😀");
  }

  #[test]
  fn combining_mark_clears_triviality() {
    let mut s = MutableString::new();
    s.append_chars(&utf16("\u{3b1}e")).unwrap();
    assert!(s.is_trivial());
    s.append_chars(&utf16("\u{301}")).unwrap();
    assert!(s.flags().checked);
    assert!(!s.is_trivial());
    assert!(s.is_basic());
  }

  #[test]
  fn removal_marks_flags_for_recompute() {
    let mut s = MutableString::new();
    s.append_chars(&utf16("a😀b")).unwrap();
    assert!(!s.is_basic());
    s.remove(1..3).unwrap();
    assert!(s.is_basic());
    assert!(s.can_be_native());
    assert!(!s.is_native());
  }

  #[test]
  fn append_self_doubles() {
    let mut s = native("ab").mutable_copy();
    s.append_self().unwrap();
    assert_eq!(s.to_string(), "abab");
    let mut w = StringValue::from_chars(&utf16("日")).unwrap().mutable_copy();
    w.append_self().unwrap();
    assert_eq!(w.to_string(), "日日");
  }

  #[test]
  fn edits_do_not_leak_into_shared_values() {
    let source = native("shared");
    let mut copy = source.mutable_copy();
    copy.prepend_native_chars(b"not ").unwrap();
    copy.insert(4, &native("yet ")).unwrap();
    assert_eq!(copy.to_string(), "not yet shared");
    assert_eq!(source.to_string(), "shared");
  }

  #[test]
  fn replace_remove_and_keep() {
    let mut s = native("hello world").mutable_copy();
    s.replace(0..5, &native("goodbye")).unwrap();
    assert_eq!(s.to_string(), "goodbye world");
    s.replace_chars(8..13, &utf16("世界")).unwrap();
    assert_eq!(s.to_string(), "goodbye 世界");
    s.remove(7..8).unwrap();
    assert_eq!(s.to_string(), "goodbye世界");
    s.keep_range(2..9).unwrap();
    assert_eq!(s.to_string(), "odbye世界");
    s.remove(40..50).unwrap();
    assert_eq!(s.len(), 7);
  }

  #[test]
  fn padding() {
    let mut s = native("7").mutable_copy();
    s.pad(0, 3, &native("0")).unwrap();
    assert_eq!(s.to_string(), "0007");
    s.pad(4, 0, &native("x")).unwrap();
    assert_eq!(s.to_string(), "0007");
    assert!(s.pad(0, usize::MAX, &native("ab")).is_err());
    assert_eq!(s.to_string(), "0007");
  }

  #[test]
  fn case_mapping() {
    let mut s = native("MiXeD É").mutable_copy();
    s.lowercase(None).unwrap();
    assert!(s.is_native());
    assert_eq!(s.to_string(), "mixed é");
    s.uppercase(None).unwrap();
    assert_eq!(s.to_string(), "MIXED É");

    let mut turkish = native("TITLE").mutable_copy();
    turkish.lowercase(Some("tr")).unwrap();
    assert!(!turkish.is_native());
    assert_eq!(turkish.to_string(), "tıtle");

    let mut wide = StringValue::from_chars(&utf16("ΣΑΣ")).unwrap().mutable_copy();
    wide.fold().unwrap();
    assert!(!wide.is_native());
    assert_eq!(wide.to_string(), "σασ");
  }

  #[test]
  fn normalization() {
    let decomposed = StringValue::from_chars(&utf16("e\u{301}")).unwrap();
    let composed = decomposed.normalized(NormalForm::Nfc).unwrap();
    assert_eq!(composed.len(), 1);
    assert!(!composed.is_native());

    let mut s = native("é").mutable_copy();
    s.normalize(NormalForm::Nfd).unwrap();
    assert_eq!(s.len(), 2);
    assert!(!s.is_native());
    s.normalize(NormalForm::Nfc).unwrap();
    assert_eq!(s.len(), 1);
  }

  #[test]
  fn lossy_nativize_substitutes_per_grapheme() {
    let mut s = StringValue::from_chars(&utf16("a😀e\u{301}")).unwrap().mutable_copy();
    s.nativize().unwrap();
    assert!(s.is_native());
    assert_eq!(s.to_string(), "a?é");
  }
}
