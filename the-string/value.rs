//! The string value types.
//!
//! [`StringData`] holds the code units of one string in either the native
//! single-byte encoding or UTF-16, plus lazily computed content flags and a
//! numeric cache. It is never used on its own: immutable strings are shared as
//! [`StringValue`] (a reference counted handle) and editable ones are
//! [`MutableString`], which borrows an immutable snapshot until its first
//! write and only then takes a private copy.

use std::{
  borrow::Cow,
  cell::Cell,
  cmp::Ordering,
  fmt,
  hash::{
    Hash,
    Hasher,
  },
  ops::{
    Deref,
    Range,
  },
  rc::Rc,
};

use the_core::{
  grapheme,
  native::{
    native_to_char,
    native_to_unit,
    unit_to_native,
  },
  unicode::{
    self,
    is_surrogate,
  },
};

use crate::{
  buffer::Buffer,
  error::Result,
};

/// What is known about the content of a UTF-16 string.
///
/// The three content flags are only meaningful while `checked` is set; a
/// mutation that cannot update them cheaply clears `checked` and the next
/// query recomputes everything. Native strings always carry [`Flags::NATIVE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Flags {
  pub checked:       bool,
  /// Every code unit has a native byte.
  pub can_be_native: bool,
  /// No surrogates at all.
  pub basic:         bool,
  /// Basic, and every code unit is a grapheme of its own.
  pub trivial:       bool,
}

impl Flags {
  pub const NATIVE: Flags = Flags {
    checked:       true,
    can_be_native: true,
    basic:         true,
    trivial:       true,
  };
  pub const UNCHECKED: Flags = Flags {
    checked:       false,
    can_be_native: false,
    basic:         false,
    trivial:       false,
  };

  pub fn compute(units: &[u16]) -> Flags {
    let basic = !units.iter().any(|&unit| is_surrogate(unit));
    let can_be_native = units.iter().all(|&unit| unit_to_native(unit).is_some());
    let trivial = basic
      && (grapheme::is_trivial(units)
        || grapheme::grapheme_boundaries(units).len() == units.len() + 1);
    Flags {
      checked: true,
      can_be_native,
      basic,
      trivial,
    }
  }

  /// The flags of a string made by inserting content flagged `other`,
  /// ignoring whatever happens at the seams.
  pub fn merged(self, other: Flags) -> Flags {
    if !self.checked || !other.checked {
      return Flags::UNCHECKED;
    }
    Flags {
      checked:       true,
      can_be_native: self.can_be_native && other.can_be_native,
      basic:         self.basic && other.basic,
      trivial:       self.trivial && other.trivial,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Units {
  Native(Buffer<u8>),
  Unicode(Buffer<u16>),
}

/// A borrowed view of the code units, whichever encoding they are in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Text<'a> {
  Native(&'a [u8]),
  Unicode(&'a [u16]),
}

#[derive(Debug)]
pub struct StringData {
  pub(crate) units:  Units,
  pub(crate) flags:  Cell<Flags>,
  pub(crate) number: Cell<Option<f64>>,
}

impl StringData {
  pub(crate) fn empty() -> Self {
    Self::native(Buffer::new())
  }

  pub(crate) fn native(buffer: Buffer<u8>) -> Self {
    Self {
      units:  Units::Native(buffer),
      flags:  Cell::new(Flags::NATIVE),
      number: Cell::new(None),
    }
  }

  pub(crate) fn unicode(buffer: Buffer<u16>, flags: Flags) -> Self {
    Self {
      units:  Units::Unicode(buffer),
      flags:  Cell::new(flags),
      number: Cell::new(None),
    }
  }

  pub(crate) fn try_clone(&self) -> Result<Self> {
    let units = match &self.units {
      Units::Native(buffer) => Units::Native(buffer.try_clone()?),
      Units::Unicode(buffer) => Units::Unicode(buffer.try_clone()?),
    };
    Ok(Self {
      units,
      flags: Cell::new(self.flags.get()),
      number: Cell::new(self.number.get()),
    })
  }

  pub(crate) fn take(&mut self) -> Self {
    std::mem::replace(self, Self::empty())
  }

  /// Length in code units (bytes for native strings).
  #[inline]
  pub fn len(&self) -> usize {
    match &self.units {
      Units::Native(buffer) => buffer.len(),
      Units::Unicode(buffer) => buffer.len(),
    }
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  #[inline]
  pub fn is_native(&self) -> bool {
    matches!(self.units, Units::Native(_))
  }

  #[inline]
  pub fn text(&self) -> Text<'_> {
    match &self.units {
      Units::Native(buffer) => Text::Native(buffer.as_slice()),
      Units::Unicode(buffer) => Text::Unicode(buffer.as_slice()),
    }
  }

  pub fn native_chars(&self) -> Option<&[u8]> {
    match &self.units {
      Units::Native(buffer) => Some(buffer.as_slice()),
      Units::Unicode(_) => None,
    }
  }

  pub fn unicode_chars(&self) -> Option<&[u16]> {
    match &self.units {
      Units::Native(_) => None,
      Units::Unicode(buffer) => Some(buffer.as_slice()),
    }
  }

  /// The native bytes followed by a NUL, for C consumers.
  pub fn native_cstr(&self) -> Option<&[u8]> {
    match &self.units {
      Units::Native(buffer) => Some(buffer.with_nul()),
      Units::Unicode(_) => None,
    }
  }

  /// The UTF-16 units followed by a NUL, for wide C consumers.
  pub fn unicode_cstr(&self) -> Option<&[u16]> {
    match &self.units {
      Units::Native(_) => None,
      Units::Unicode(buffer) => Some(buffer.with_nul()),
    }
  }

  /// The content as UTF-16, borrowed when it already is.
  pub fn chars(&self) -> Cow<'_, [u16]> {
    match &self.units {
      Units::Native(buffer) => Cow::Owned(buffer.as_slice().iter().map(|&b| native_to_unit(b)).collect()),
      Units::Unicode(buffer) => Cow::Borrowed(buffer.as_slice()),
    }
  }

  pub fn unit_iter(&self) -> UnitIter<'_> {
    match &self.units {
      Units::Native(buffer) => UnitIter::Native(buffer.as_slice().iter()),
      Units::Unicode(buffer) => UnitIter::Unicode(buffer.as_slice().iter()),
    }
  }

  pub fn codepoints(&self) -> impl Iterator<Item = char> + '_ {
    let (native, wide) = match &self.units {
      Units::Native(buffer) => (Some(buffer.as_slice()), None),
      Units::Unicode(buffer) => (None, Some(buffer.as_slice())),
    };
    native
      .into_iter()
      .flatten()
      .map(|&byte| native_to_char(byte))
      .chain(
        wide
          .into_iter()
          .flat_map(|units| unicode::codepoints(units).map(|(_, ch, _)| ch)),
      )
  }

  /// The code unit at `idx`, or `None` past the end.
  pub fn char_at(&self, idx: usize) -> Option<u16> {
    match &self.units {
      Units::Native(buffer) => buffer.as_slice().get(idx).map(|&b| native_to_unit(b)),
      Units::Unicode(buffer) => buffer.as_slice().get(idx).copied(),
    }
  }

  /// The code unit at `idx` as a native byte; unmappable units read as `?`.
  pub fn native_char_at(&self, idx: usize) -> Option<u8> {
    match &self.units {
      Units::Native(buffer) => buffer.as_slice().get(idx).copied(),
      Units::Unicode(buffer) => buffer
        .as_slice()
        .get(idx)
        .map(|&unit| unit_to_native(unit).unwrap_or(b'?')),
    }
  }

  /// The codepoint with the given codepoint index.
  pub fn codepoint_at(&self, idx: usize) -> Option<char> {
    match &self.units {
      Units::Native(buffer) => buffer.as_slice().get(idx).map(|&b| native_to_char(b)),
      Units::Unicode(buffer) if self.is_basic() => buffer
        .as_slice()
        .get(idx)
        .map(|&unit| char::from_u32(unit as u32).unwrap_or(char::REPLACEMENT_CHARACTER)),
      Units::Unicode(_) => self.codepoints().nth(idx),
    }
  }

  pub fn flags(&self) -> Flags {
    let mut flags = self.flags.get();
    if !flags.checked {
      flags = match &self.units {
        Units::Native(_) => Flags::NATIVE,
        Units::Unicode(buffer) => Flags::compute(buffer.as_slice()),
      };
      self.flags.set(flags);
    }
    flags
  }

  pub fn can_be_native(&self) -> bool {
    self.flags().can_be_native
  }

  pub fn is_basic(&self) -> bool {
    self.flags().basic
  }

  pub fn is_trivial(&self) -> bool {
    self.flags().trivial
  }

  /// A fresh immutable string holding the units in `range`, clamped to the
  /// string.
  pub fn substring(&self, range: Range<usize>) -> Result<StringValue> {
    let range = clamp(range, self.len());
    if range.is_empty() {
      return Ok(StringValue::empty());
    }
    if range.start == 0 && range.end == self.len() {
      return Ok(StringValue::from_data(self.try_clone()?));
    }
    let data = match &self.units {
      Units::Native(buffer) => StringData::native(Buffer::from_slice(&buffer.as_slice()[range])?),
      Units::Unicode(buffer) => {
        // Native-mappable content stays trivial however it is cut.
        let parent = self.flags.get();
        let flags = if parent.checked && parent.can_be_native {
          Flags::NATIVE
        } else {
          Flags::UNCHECKED
        };
        StringData::unicode(Buffer::from_slice(&buffer.as_slice()[range])?, flags)
      },
    };
    Ok(StringValue::from_data(data))
  }
}

impl fmt::Display for StringData {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    use fmt::Write;
    for ch in self.codepoints() {
      f.write_char(ch)?;
    }
    Ok(())
  }
}

/// Code units of either encoding, widened to UTF-16.
#[derive(Debug, Clone)]
pub enum UnitIter<'a> {
  Native(std::slice::Iter<'a, u8>),
  Unicode(std::slice::Iter<'a, u16>),
}

impl Iterator for UnitIter<'_> {
  type Item = u16;

  #[inline]
  fn next(&mut self) -> Option<u16> {
    match self {
      UnitIter::Native(iter) => iter.next().map(|&b| native_to_unit(b)),
      UnitIter::Unicode(iter) => iter.next().copied(),
    }
  }

  fn size_hint(&self) -> (usize, Option<usize>) {
    match self {
      UnitIter::Native(iter) => iter.size_hint(),
      UnitIter::Unicode(iter) => iter.size_hint(),
    }
  }
}

pub(crate) fn clamp(range: Range<usize>, len: usize) -> Range<usize> {
  let start = range.start.min(len);
  start..range.end.clamp(start, len)
}

thread_local! {
  static EMPTY: StringValue = StringValue(Rc::new(StringData::empty()));
}

/// An immutable, cheaply cloned string.
#[derive(Clone)]
pub struct StringValue(Rc<StringData>);

impl StringValue {
  /// The shared empty string. Every empty result is this same value.
  pub fn empty() -> Self {
    EMPTY.with(StringValue::clone)
  }

  pub(crate) fn from_data(data: StringData) -> Self {
    if data.is_empty() {
      return Self::empty();
    }
    Self(Rc::new(data))
  }

  /// Another handle to the same value.
  pub fn copy(&self) -> Self {
    self.clone()
  }

  /// A mutable string that shares this value until it is first written.
  pub fn mutable_copy(&self) -> MutableString {
    MutableString {
      storage: Storage::Shared(Rc::clone(&self.0)),
    }
  }

  pub fn ptr_eq(&self, other: &StringValue) -> bool {
    Rc::ptr_eq(&self.0, &other.0)
  }
}

impl Deref for StringValue {
  type Target = StringData;

  fn deref(&self) -> &StringData {
    &self.0
  }
}

impl Default for StringValue {
  fn default() -> Self {
    Self::empty()
  }
}

impl fmt::Debug for StringValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:?}", self.to_string())
  }
}

impl fmt::Display for StringValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Display::fmt(&*self.0, f)
  }
}

impl PartialEq for StringValue {
  fn eq(&self, other: &Self) -> bool {
    self.ptr_eq(other) || (self.len() == other.len() && self.unit_iter().eq(other.unit_iter()))
  }
}

impl Eq for StringValue {}

impl Hash for StringValue {
  fn hash<H: Hasher>(&self, state: &mut H) {
    state.write_usize(self.len());
    for unit in self.unit_iter() {
      state.write_u16(unit);
    }
  }
}

impl PartialOrd for StringValue {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for StringValue {
  fn cmp(&self, other: &Self) -> Ordering {
    self
      .codepoints()
      .cmp(other.codepoints())
      .then_with(|| self.unit_iter().cmp(other.unit_iter()))
  }
}

enum Storage {
  Owned(StringData),
  Shared(Rc<StringData>),
}

/// A string that can be edited in place.
///
/// Created empty, or from a [`StringValue`] with [`StringValue::mutable_copy`],
/// in which case it reads through to the shared value until the first write.
/// Writes go through [`MutableString::data_mut`], which detaches from the
/// shared value: by taking it over if this is the last handle, by copying it
/// otherwise.
pub struct MutableString {
  storage: Storage,
}

impl MutableString {
  pub fn new() -> Self {
    Self {
      storage: Storage::Owned(StringData::empty()),
    }
  }

  pub fn is_shared(&self) -> bool {
    matches!(self.storage, Storage::Shared(_))
  }

  pub(crate) fn data_mut(&mut self) -> Result<&mut StringData> {
    if let Storage::Shared(shared) = &mut self.storage {
      let data = match Rc::get_mut(shared) {
        Some(data) => data.take(),
        None => shared.try_clone()?,
      };
      self.storage = Storage::Owned(data);
    }
    match &mut self.storage {
      Storage::Owned(data) => Ok(data),
      Storage::Shared(_) => unreachable!("storage was detached above"),
    }
  }

  /// Freezes the current content into an immutable value. This string keeps
  /// reading through to it and copies again on its next write.
  pub fn copy(&mut self) -> StringValue {
    if self.is_empty() {
      return StringValue::empty();
    }
    let shared = match std::mem::replace(&mut self.storage, Storage::Owned(StringData::empty())) {
      Storage::Owned(data) => Rc::new(data),
      Storage::Shared(shared) => shared,
    };
    self.storage = Storage::Shared(Rc::clone(&shared));
    StringValue(shared)
  }

  /// Freezes the content without keeping a handle around.
  pub fn into_value(self) -> StringValue {
    if self.is_empty() {
      return StringValue::empty();
    }
    match self.storage {
      Storage::Owned(data) => StringValue(Rc::new(data)),
      Storage::Shared(shared) => StringValue(shared),
    }
  }
}

impl Default for MutableString {
  fn default() -> Self {
    Self::new()
  }
}

impl Deref for MutableString {
  type Target = StringData;

  fn deref(&self) -> &StringData {
    match &self.storage {
      Storage::Owned(data) => data,
      Storage::Shared(shared) => &**shared,
    }
  }
}

impl fmt::Debug for MutableString {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:?}", self.to_string())
  }
}

impl fmt::Display for MutableString {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Display::fmt(&**self, f)
  }
}
