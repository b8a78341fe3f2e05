//! NUL-terminated growable storage for code units.
//!
//! A [`Buffer`] always keeps one zero unit past its logical end so the
//! contents can be handed to C-style consumers without copying. Capacity grows
//! geometrically and is rounded up to [`BLOCK`] units; every growth goes
//! through `try_reserve_exact`, so a failed allocation leaves the buffer as it
//! was.

use std::ops::Range;

use crate::error::{
  Result,
  StringError,
};

/// Capacity is always a multiple of this many units.
pub const BLOCK: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buffer<T> {
  /// The units followed by a single zero unit.
  data: Vec<T>,
}

impl<T: Copy + Default> Default for Buffer<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T: Copy + Default> Buffer<T> {
  pub fn new() -> Self {
    Self {
      data: vec![T::default()],
    }
  }

  pub fn from_slice(units: &[T]) -> Result<Self> {
    let mut buffer = Self {
      data: Vec::new(),
    };
    buffer.data.try_reserve_exact(rounded_capacity::<T>(units.len())?)?;
    buffer.data.extend_from_slice(units);
    buffer.data.push(T::default());
    Ok(buffer)
  }

  pub fn from_iter_exact(len: usize, units: impl Iterator<Item = T>) -> Result<Self> {
    let mut buffer = Self {
      data: Vec::new(),
    };
    buffer.data.try_reserve_exact(rounded_capacity::<T>(len)?)?;
    buffer.data.extend(units);
    buffer.data.push(T::default());
    Ok(buffer)
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.data.len() - 1
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Units available before the next reallocation.
  #[inline]
  pub fn capacity(&self) -> usize {
    self.data.capacity().saturating_sub(1)
  }

  #[inline]
  pub fn as_slice(&self) -> &[T] {
    &self.data[..self.len()]
  }

  #[inline]
  pub fn as_mut_slice(&mut self) -> &mut [T] {
    let len = self.len();
    &mut self.data[..len]
  }

  /// The units including the trailing zero.
  #[inline]
  pub fn with_nul(&self) -> &[T] {
    &self.data
  }

  /// Makes room for `additional` more units without touching the contents.
  pub fn reserve(&mut self, additional: usize) -> Result<()> {
    let wanted = self
      .len()
      .checked_add(additional)
      .ok_or(StringError::Overflow {
        requested: usize::MAX,
      })?;
    if wanted <= self.capacity() {
      return Ok(());
    }
    let grown = wanted.max(self.capacity() + self.capacity() / 2);
    let target = rounded_capacity::<T>(grown)?;
    self.data.try_reserve_exact(target - self.data.len())?;
    Ok(())
  }

  /// Replaces `range` with `units`. On failure nothing changes.
  pub fn splice(&mut self, range: Range<usize>, units: &[T]) -> Result<()> {
    debug_assert!(range.start <= range.end && range.end <= self.len());
    let removed = range.end - range.start;
    if units.len() > removed {
      self.reserve(units.len() - removed)?;
    }
    if units.len() == removed {
      self.data[range].copy_from_slice(units);
    } else {
      self.data.splice(range, units.iter().copied());
    }
    Ok(())
  }

  pub fn push(&mut self, unit: T) -> Result<()> {
    self.reserve(1)?;
    let len = self.len();
    self.data[len] = unit;
    self.data.push(T::default());
    Ok(())
  }

  pub fn truncate(&mut self, len: usize) {
    if len < self.len() {
      self.data.truncate(len);
      self.data.push(T::default());
    }
  }

  pub fn try_clone(&self) -> Result<Self> {
    Self::from_slice(self.as_slice())
  }
}

/// `len` units plus the terminator, rounded up to a whole block, checked
/// against the largest allocation the platform can address.
fn rounded_capacity<T>(len: usize) -> Result<usize> {
  let overflow = StringError::Overflow { requested: len };
  let units = len
    .checked_add(1 + BLOCK - 1)
    .map(|n| n & !(BLOCK - 1))
    .ok_or_else(|| overflow.clone())?;
  match units.checked_mul(std::mem::size_of::<T>()) {
    Some(bytes) if bytes <= isize::MAX as usize => Ok(units),
    _ => Err(overflow),
  }
}
