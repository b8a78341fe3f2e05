//! Mapping between code unit offsets and the other ways of counting text.
//!
//! A string is stored as code units, but it can also be addressed as
//! codepoints, graphemes, true words, sentences or paragraphs. [`Segments`]
//! lists where each of those segments lies in code units. `map` takes a range
//! of segment indices to the code units it covers and `unmap` goes the other
//! way. When the content flags prove that codepoints or graphemes are single
//! code units the mapping is the identity and nothing is scanned.

use std::ops::Range;

use the_core::{
  grapheme,
  line_ending::paragraph_ranges,
  unicode::{
    self,
    BreakKind,
    Transcoded,
  },
};

use crate::value::{
  StringData,
  clamp,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexSpace {
  CodeUnit,
  Codepoint,
  Grapheme,
  TrueWord,
  Sentence,
  Paragraph,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segments {
  /// Every code unit of the range is a segment.
  Identity(Range<usize>),
  /// Adjacent segments, as their boundaries including both ends.
  Bounds(Vec<usize>),
  /// Segments with gaps between them, followed by the end of the range.
  Spans { spans: Vec<Range<usize>>, end: usize },
}

impl Segments {
  pub fn count(&self) -> usize {
    match self {
      Segments::Identity(range) => range.len(),
      Segments::Bounds(bounds) => bounds.len().saturating_sub(1),
      Segments::Spans { spans, .. } => spans.len(),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.count() == 0
  }

  /// Code units of segment `idx`.
  pub fn get(&self, idx: usize) -> Option<Range<usize>> {
    (idx < self.count()).then(|| self.map(idx..idx + 1))
  }

  /// Code units covered by the segments in `range`. Indices past the end
  /// are clamped; an empty range maps to an empty range where its start
  /// segment begins.
  pub fn map(&self, range: Range<usize>) -> Range<usize> {
    let range = clamp(range, self.count());
    match self {
      Segments::Identity(within) => within.start + range.start..within.start + range.end,
      Segments::Bounds(bounds) => bounds[range.start]..bounds[range.end],
      Segments::Spans { spans, end } => {
        let start = spans.get(range.start).map_or(*end, |span| span.start);
        if range.is_empty() {
          return start..start;
        }
        start..spans[range.end - 1].end
      },
    }
  }

  /// Indices of the segments that `units` touches.
  pub fn unmap(&self, units: Range<usize>) -> Range<usize> {
    let count = self.count();
    let (start, end) = match self {
      Segments::Identity(within) => (
        units.start.saturating_sub(within.start),
        units.end.saturating_sub(within.start),
      ),
      Segments::Bounds(bounds) => (
        bounds.partition_point(|&at| at <= units.start).saturating_sub(1),
        bounds.partition_point(|&at| at < units.end),
      ),
      Segments::Spans { spans, .. } => (
        spans.partition_point(|span| span.end <= units.start),
        spans.partition_point(|span| span.start < units.end),
      ),
    };
    let start = start.min(count);
    start..end.clamp(start, count)
  }
}

fn offset_bounds(mut bounds: Vec<usize>, by: usize) -> Vec<usize> {
  if by > 0 {
    bounds.iter_mut().for_each(|at| *at += by);
  }
  bounds
}

impl StringData {
  /// The segments of `space` inside the code units `within`.
  pub fn segments(&self, space: IndexSpace, within: Range<usize>) -> Segments {
    let within = clamp(within, self.len());
    let identity = match space {
      IndexSpace::CodeUnit => true,
      IndexSpace::Codepoint => self.is_basic(),
      IndexSpace::Grapheme => self.is_trivial(),
      _ => false,
    };
    if identity {
      return Segments::Identity(within);
    }

    let units = self.text().slice(within.clone()).units();
    let base = within.start;
    match space {
      IndexSpace::Codepoint => {
        let mut bounds: Vec<usize> = unicode::codepoints(&units).map(|(at, ..)| base + at).collect();
        bounds.push(within.end);
        Segments::Bounds(bounds)
      },
      IndexSpace::Grapheme => Segments::Bounds(offset_bounds(grapheme::grapheme_boundaries(&units), base)),
      IndexSpace::Sentence => {
        if units.is_empty() {
          return Segments::Bounds(vec![base]);
        }
        let bounds = Transcoded::from_units(&units).boundaries(BreakKind::Sentence);
        Segments::Bounds(offset_bounds(bounds, base))
      },
      IndexSpace::TrueWord => {
        let service = unicode::service();
        let bounds = Transcoded::from_units(&units).boundaries(BreakKind::Word);
        let spans = bounds
          .windows(2)
          .filter(|pair| {
            unicode::codepoints(&units[pair[0]..pair[1]]).any(|(_, ch, _)| service.is_word_part(ch))
          })
          .map(|pair| base + pair[0]..base + pair[1])
          .collect();
        Segments::Spans {
          spans,
          end: within.end,
        }
      },
      IndexSpace::Paragraph => Segments::Spans {
        spans: paragraph_ranges(&units, 0..units.len())
          .into_iter()
          .map(|span| base + span.start..base + span.end)
          .collect(),
        end: within.end,
      },
      IndexSpace::CodeUnit => unreachable!("code units are always the identity"),
    }
  }

  /// Code units covered by `range` counted in `space`.
  pub fn map_indices(&self, space: IndexSpace, range: Range<usize>) -> Range<usize> {
    self.segments(space, 0..self.len()).map(range)
  }

  /// Indices in `space` of the segments touched by the code units `units`.
  pub fn unmap_indices(&self, space: IndexSpace, units: Range<usize>) -> Range<usize> {
    self.segments(space, 0..self.len()).unmap(units)
  }

  pub fn map_codepoint_indices(&self, range: Range<usize>) -> Range<usize> {
    self.map_indices(IndexSpace::Codepoint, range)
  }

  pub fn unmap_codepoint_indices(&self, units: Range<usize>) -> Range<usize> {
    self.unmap_indices(IndexSpace::Codepoint, units)
  }

  pub fn map_grapheme_indices(&self, range: Range<usize>) -> Range<usize> {
    self.map_indices(IndexSpace::Grapheme, range)
  }

  pub fn unmap_grapheme_indices(&self, units: Range<usize>) -> Range<usize> {
    self.unmap_indices(IndexSpace::Grapheme, units)
  }

  /// Number of segments of `space` in the whole string.
  pub fn segment_count(&self, space: IndexSpace) -> usize {
    self.segments(space, 0..self.len()).count()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::value::StringValue;

  fn wide(text: &str) -> StringValue {
    StringValue::from_chars(&text.encode_utf16().collect::<Vec<_>>()).unwrap()
  }

  fn pieces(value: &StringValue, space: IndexSpace) -> Vec<String> {
    let segments = value.segments(space, 0..value.len());
    (0..segments.count())
      .map(|idx| value.substring(segments.map(idx..idx + 1)).unwrap().to_string())
      .collect()
  }

  quickcheck::quickcheck! {
    fn grapheme_map_then_unmap_round_trips(text: String, a: usize, b: usize) -> bool {
      let value = wide(&text);
      let segments = value.segments(IndexSpace::Grapheme, 0..value.len());
      let count = segments.count();
      let (a, b) = (a % (count + 1), b % (count + 1));
      let range = a.min(b)..a.max(b);
      let units = value.map_grapheme_indices(range.clone());
      value.unmap_grapheme_indices(units) == range
    }

    fn grapheme_aligned_units_round_trip(text: String, a: usize, b: usize) -> bool {
      let value = wide(&text);
      let Segments::Bounds(bounds) = value.segments(IndexSpace::Grapheme, 0..value.len()) else {
        return true;
      };
      let (a, b) = (bounds[a % bounds.len()], bounds[b % bounds.len()]);
      let units = a.min(b)..a.max(b);
      value.map_grapheme_indices(value.unmap_grapheme_indices(units.clone())) == units
    }

    fn codepoint_map_then_unmap_round_trips(text: String) -> bool {
      let value = wide(&text);
      let count = value.segment_count(IndexSpace::Codepoint);
      (0..=count).all(|idx| {
        let units = value.map_codepoint_indices(idx..count);
        value.unmap_codepoint_indices(units) == (idx..count)
      })
    }
  }

  #[test]
  fn trivial_strings_map_to_themselves() {
    let value: StringValue = "plain café".parse().unwrap();
    assert_eq!(value.segments(IndexSpace::Grapheme, 2..6), Segments::Identity(2..6));
    assert_eq!(value.map_grapheme_indices(3..7), 3..7);
    assert_eq!(value.unmap_codepoint_indices(1..4), 1..4);

    let greek = wide("αβγ");
    assert!(matches!(greek.segments(IndexSpace::Codepoint, 0..3), Segments::Identity(_)));
    assert!(matches!(greek.segments(IndexSpace::Grapheme, 0..3), Segments::Identity(_)));
  }

  #[test]
  fn surrogate_pairs_are_one_codepoint() {
    let value = wide("a😀b");
    assert_eq!(value.segment_count(IndexSpace::Codepoint), 3);
    assert_eq!(value.map_codepoint_indices(1..2), 1..3);
    assert_eq!(value.map_codepoint_indices(2..3), 3..4);
    assert_eq!(value.unmap_codepoint_indices(2..3), 1..2);
    assert_eq!(value.unmap_codepoint_indices(0..4), 0..3);
  }

  #[test]
  fn combining_marks_join_their_base() {
    let value = wide("ne\u{301}e");
    assert_eq!(value.segment_count(IndexSpace::Codepoint), 4);
    assert_eq!(value.segment_count(IndexSpace::Grapheme), 3);
    assert_eq!(value.map_grapheme_indices(1..2), 1..3);
    assert_eq!(value.unmap_grapheme_indices(2..3), 1..2);
    assert_eq!(value.map_grapheme_indices(5..9), 4..4);
  }

  #[test]
  fn segments_within_a_range_are_absolute() {
    let value = wide("xx😀😀");
    let segments = value.segments(IndexSpace::Codepoint, 2..6);
    assert_eq!(segments.count(), 2);
    assert_eq!(segments.get(1), Some(4..6));
    assert_eq!(segments.unmap(4..6), 1..2);
  }

  #[test]
  fn true_words_skip_punctuation_and_space() {
    let value: StringValue = "Hello, world! It's 42.".parse().unwrap();
    assert_eq!(pieces(&value, IndexSpace::TrueWord), ["Hello", "world", "It's", "42"]);
    let words = value.segments(IndexSpace::TrueWord, 0..value.len());
    assert_eq!(words.unmap(5..7), 1..1);
    assert_eq!(words.map(4..4), value.len()..value.len());
  }

  #[test]
  fn sentences_and_paragraphs() {
    let value: StringValue = "One. Two? Three".parse().unwrap();
    assert_eq!(pieces(&value, IndexSpace::Sentence), ["One. ", "Two? ", "Three"]);
    let value: StringValue = "One\nTwo\n\nThree\n".parse().unwrap();
    assert_eq!(pieces(&value, IndexSpace::Paragraph), ["One", "Two", "", "Three"]);
    assert_eq!(StringValue::empty().segment_count(IndexSpace::Sentence), 0);
    assert_eq!(StringValue::empty().segment_count(IndexSpace::Paragraph), 0);
  }
}
