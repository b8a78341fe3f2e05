//! Forward and reverse scanning over native byte runs.
//!
//! Every algorithm in this module is written once against [`CharEq`] and
//! instantiated with one of three predicates:
//!
//! - [`Unfolded`]: bytes compare exactly.
//! - [`Prefolded`]: the needle was folded once up front, only the haystack is
//!   folded per comparison.
//! - [`Folded`]: both sides are folded on every comparison.
//!
//! The predicate is picked once per call from the requested [`Folding`] and
//! the needle length: caseless needles of at most [`PREFOLD_LIMIT`] bytes are
//! prefolded into a stack buffer, longer ones fall back to [`Folded`]. All three
//! predicates give identical answers; the choice only affects speed.
//!
//! An empty needle never matches anything.

use std::cmp::Ordering;

use smallvec::SmallVec;

use crate::native;

pub const PREFOLD_LIMIT: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Folding {
  Exact,
  Caseless,
}

pub trait CharEq {
  fn eq(haystack: u8, needle: u8) -> bool;

  /// The form a needle byte must be in before it is handed to [`CharEq::eq`].
  fn prepare(needle: u8) -> u8 {
    needle
  }
}

pub struct Unfolded;
pub struct Prefolded;
pub struct Folded;

impl CharEq for Unfolded {
  #[inline(always)]
  fn eq(haystack: u8, needle: u8) -> bool {
    haystack == needle
  }
}

impl CharEq for Prefolded {
  #[inline(always)]
  fn eq(haystack: u8, needle: u8) -> bool {
    native::fold(haystack) == needle
  }

  #[inline(always)]
  fn prepare(needle: u8) -> u8 {
    native::fold(needle)
  }
}

impl CharEq for Folded {
  #[inline(always)]
  fn eq(haystack: u8, needle: u8) -> bool {
    native::fold(haystack) == native::fold(needle)
  }
}

pub fn forward_char<E: CharEq>(haystack: &[u8], needle: u8) -> Option<usize> {
  haystack.iter().position(|&b| E::eq(b, needle))
}

pub fn reverse_char<E: CharEq>(haystack: &[u8], needle: u8) -> Option<usize> {
  haystack.iter().rposition(|&b| E::eq(b, needle))
}

#[inline]
fn matches_at<E: CharEq>(haystack: &[u8], at: usize, needle: &[u8]) -> bool {
  haystack[at..at + needle.len()]
    .iter()
    .zip(needle)
    .all(|(&h, &n)| E::eq(h, n))
}

pub fn forward_find<E: CharEq>(haystack: &[u8], needle: &[u8]) -> Option<usize> {
  if needle.is_empty() || needle.len() > haystack.len() {
    return None;
  }
  (0..=haystack.len() - needle.len()).find(|&at| matches_at::<E>(haystack, at, needle))
}

pub fn reverse_find<E: CharEq>(haystack: &[u8], needle: &[u8]) -> Option<usize> {
  if needle.is_empty() || needle.len() > haystack.len() {
    return None;
  }
  (0..=haystack.len() - needle.len())
    .rev()
    .find(|&at| matches_at::<E>(haystack, at, needle))
}

/// Counts non-overlapping occurrences, scanning left to right.
pub fn forward_count<E: CharEq>(haystack: &[u8], needle: &[u8]) -> usize {
  if needle.is_empty() {
    return 0;
  }
  let mut count = 0;
  let mut at = 0;
  while let Some(found) = forward_find::<E>(&haystack[at..], needle) {
    count += 1;
    at += found + needle.len();
  }
  count
}

pub fn forward_shared<E: CharEq>(left: &[u8], right: &[u8]) -> usize {
  left
    .iter()
    .zip(right)
    .take_while(|&(&l, &r)| E::eq(l, r))
    .count()
}

pub fn reverse_shared<E: CharEq>(left: &[u8], right: &[u8]) -> usize {
  left
    .iter()
    .rev()
    .zip(right.iter().rev())
    .take_while(|&(&l, &r)| E::eq(l, r))
    .count()
}

/// A needle with the comparison predicate already chosen.
enum Needle<'a> {
  Unfolded(&'a [u8]),
  Prefolded(SmallVec<[u8; PREFOLD_LIMIT]>),
  Folded(&'a [u8]),
}

impl<'a> Needle<'a> {
  fn new(needle: &'a [u8], folding: Folding) -> Self {
    match folding {
      Folding::Exact => Needle::Unfolded(needle),
      Folding::Caseless if needle.len() <= PREFOLD_LIMIT => {
        Needle::Prefolded(needle.iter().map(|&b| Prefolded::prepare(b)).collect())
      },
      Folding::Caseless => Needle::Folded(needle),
    }
  }
}

macro_rules! with_needle {
  ($needle:expr, $func:ident($($arg:expr),*)) => {
    match $needle {
      Needle::Unfolded(n) => $func::<Unfolded>($($arg,)* n),
      Needle::Prefolded(ref n) => $func::<Prefolded>($($arg,)* n.as_slice()),
      Needle::Folded(n) => $func::<Folded>($($arg,)* n),
    }
  };
}

pub fn first_index_of(haystack: &[u8], needle: &[u8], folding: Folding) -> Option<usize> {
  with_needle!(Needle::new(needle, folding), forward_find(haystack))
}

pub fn last_index_of(haystack: &[u8], needle: &[u8], folding: Folding) -> Option<usize> {
  with_needle!(Needle::new(needle, folding), reverse_find(haystack))
}

pub fn count(haystack: &[u8], needle: &[u8], folding: Folding) -> usize {
  with_needle!(Needle::new(needle, folding), forward_count(haystack))
}

pub fn first_index_of_char(haystack: &[u8], needle: u8, folding: Folding) -> Option<usize> {
  match folding {
    Folding::Caseless => match native::checked_fold(needle) {
      (folded, true) => forward_char::<Prefolded>(haystack, folded),
      (_, false) => forward_char::<Unfolded>(haystack, needle),
    },
    Folding::Exact => forward_char::<Unfolded>(haystack, needle),
  }
}

pub fn last_index_of_char(haystack: &[u8], needle: u8, folding: Folding) -> Option<usize> {
  match folding {
    Folding::Caseless => match native::checked_fold(needle) {
      (folded, true) => reverse_char::<Prefolded>(haystack, folded),
      (_, false) => reverse_char::<Unfolded>(haystack, needle),
    },
    Folding::Exact => reverse_char::<Unfolded>(haystack, needle),
  }
}

pub fn shared_prefix(left: &[u8], right: &[u8], folding: Folding) -> usize {
  match folding {
    Folding::Exact => forward_shared::<Unfolded>(left, right),
    Folding::Caseless => forward_shared::<Folded>(left, right),
  }
}

pub fn shared_suffix(left: &[u8], right: &[u8], folding: Folding) -> usize {
  match folding {
    Folding::Exact => reverse_shared::<Unfolded>(left, right),
    Folding::Caseless => reverse_shared::<Folded>(left, right),
  }
}

pub fn equal(left: &[u8], right: &[u8], folding: Folding) -> bool {
  left.len() == right.len() && shared_prefix(left, right, folding) == left.len()
}

/// Orders two native runs by the Unicode scalar values they encode, so the
/// result matches a codepoint-wise comparison of the same text.
pub fn compare(left: &[u8], right: &[u8], folding: Folding) -> Ordering {
  let key = |b: u8| match folding {
    Folding::Exact => native::native_to_char(b),
    Folding::Caseless => native::native_to_char(native::fold(b)),
  };
  let shared = shared_prefix(left, right, folding);
  match (left.get(shared), right.get(shared)) {
    (Some(&l), Some(&r)) => key(l).cmp(&key(r)),
    (l, r) => l.is_some().cmp(&r.is_some()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn prefold(bytes: &[u8]) -> Vec<u8> {
    bytes.iter().map(|&b| Prefolded::prepare(b)).collect()
  }

  quickcheck::quickcheck! {
    fn predicates_agree_on_find(haystack: Vec<u8>, needle: Vec<u8>) -> bool {
      let folded = forward_find::<Folded>(&haystack, &needle);
      folded == forward_find::<Prefolded>(&haystack, &prefold(&needle))
        && reverse_find::<Folded>(&haystack, &needle)
          == reverse_find::<Prefolded>(&haystack, &prefold(&needle))
    }

    fn caseless_find_agrees_past_prefold_limit(haystack: Vec<u8>, seed: Vec<u8>) -> bool {
      let mut needle = seed;
      needle.resize(PREFOLD_LIMIT + 3, b'a');
      first_index_of(&haystack, &needle, Folding::Caseless)
        == forward_find::<Prefolded>(&haystack, &prefold(&needle))
    }

    fn exact_find_matches_windows(haystack: Vec<u8>, needle: Vec<u8>) -> bool {
      let expected = if needle.is_empty() {
        None
      } else {
        haystack.windows(needle.len()).position(|w| w == needle.as_slice())
      };
      first_index_of(&haystack, &needle, Folding::Exact) == expected
    }

    fn compare_is_antisymmetric(left: Vec<u8>, right: Vec<u8>) -> bool {
      compare(&left, &right, Folding::Caseless) == compare(&right, &left, Folding::Caseless).reverse()
    }
  }

  #[test]
  fn empty_needle_never_matches() {
    assert_eq!(first_index_of(b"abc", b"", Folding::Exact), None);
    assert_eq!(last_index_of(b"abc", b"", Folding::Caseless), None);
    assert_eq!(count(b"abc", b"", Folding::Exact), 0);
  }

  #[test]
  fn caseless_search() {
    assert_eq!(first_index_of(b"Hello World", b"WORLD", Folding::Caseless), Some(6));
    assert_eq!(first_index_of(b"Hello World", b"WORLD", Folding::Exact), None);
    assert_eq!(last_index_of(b"abcABC", b"abc", Folding::Caseless), Some(3));
    assert_eq!(first_index_of_char(b"xyZ", b'z', Folding::Caseless), Some(2));
    assert_eq!(last_index_of_char(b"a,b,c", b',', Folding::Caseless), Some(3));
  }

  #[test]
  fn count_is_non_overlapping() {
    assert_eq!(count(b"aaaa", b"aa", Folding::Exact), 2);
    assert_eq!(count(b"aXbXc", b"x", Folding::Caseless), 2);
  }

  #[test]
  fn shared_prefix_and_suffix() {
    assert_eq!(shared_prefix(b"prefix", b"PREfab", Folding::Caseless), 4);
    assert_eq!(shared_prefix(b"prefix", b"PREfab", Folding::Exact), 0);
    assert_eq!(shared_suffix(b"running", b"JOGGING", Folding::Caseless), 3);
  }

  #[test]
  fn compare_orders_by_codepoint() {
    assert_eq!(compare(b"abc", b"abd", Folding::Exact), Ordering::Less);
    assert_eq!(compare(b"ab", b"abc", Folding::Exact), Ordering::Less);
    assert_eq!(compare(b"ABC", b"abc", Folding::Caseless), Ordering::Equal);
    assert!(equal(b"ABC", b"abc", Folding::Caseless));
    assert!(!equal(b"ABC", b"abc", Folding::Exact));
  }
}
