use std::ops::Range;

#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum LineEnding {
  /// CarriageReturn followed by LineFeed.
  Crlf,

  /// U+000A -- LineFeed
  LF,

  /// U+000B -- VerticalTab
  VT,

  /// U+000C -- FormFeed
  FF,

  /// U+000D -- CarriageReturn
  CR,

  /// U+0085 -- NextLine
  Nel,

  /// U+2028 -- Line Separator
  LS,

  /// U+2029 -- ParagraphSeparator
  PS,
}

impl LineEnding {
  #[inline]
  pub const fn len_units(&self) -> usize {
    match self {
      Self::Crlf => 2,
      _ => 1,
    }
  }

  #[inline]
  pub const fn from_char(ch: char) -> Option<LineEnding> {
    match ch {
      '\u{000A}' => Some(LineEnding::LF),
      '\u{000B}' => Some(LineEnding::VT),
      '\u{000C}' => Some(LineEnding::FF),
      '\u{000D}' => Some(LineEnding::CR),
      '\u{0085}' => Some(LineEnding::Nel),
      '\u{2028}' => Some(LineEnding::LS),
      '\u{2029}' => Some(LineEnding::PS),
      _ => None,
    }
  }

  /// The line ending starting at `at`, preferring CR LF over a lone CR.
  #[inline]
  pub fn from_units(units: &[u16], at: usize) -> Option<LineEnding> {
    let first = *units.get(at)?;
    if first == 0x0D && units.get(at + 1) == Some(&0x0A) {
      return Some(LineEnding::Crlf);
    }
    char::from_u32(first as u32).and_then(LineEnding::from_char)
  }

  /// Whether this ending closes a paragraph rather than just a line.
  #[inline]
  pub const fn is_paragraph_separator(&self) -> bool {
    matches!(self, Self::Crlf | Self::LF | Self::CR | Self::PS)
  }
}

/// Finds the next paragraph separator at or after `from`, returning where it
/// starts and how many units it spans.
pub fn next_paragraph_break(units: &[u16], from: usize) -> Option<(usize, usize)> {
  (from..units.len()).find_map(|at| {
    LineEnding::from_units(units, at)
      .filter(LineEnding::is_paragraph_separator)
      .map(|ending| (at, ending.len_units()))
  })
}

/// The paragraphs of `units[range]`, separators excluded. A trailing
/// separator does not open an empty final paragraph.
pub fn paragraph_ranges(units: &[u16], range: Range<usize>) -> Vec<Range<usize>> {
  let text = &units[..range.end];
  let mut out = Vec::new();
  let mut start = range.start;
  if start >= range.end {
    return out;
  }
  while let Some((at, len)) = next_paragraph_break(text, start) {
    out.push(start..at);
    start = at + len;
    if start >= range.end {
      return out;
    }
  }
  out.push(start..range.end);
  out
}

#[cfg(test)]
mod line_ending_tests {
  use super::*;

  fn utf16(s: &str) -> Vec<u16> {
    s.encode_utf16().collect()
  }

  #[test]
  fn char_to_line_ending() {
    assert_eq!(LineEnding::from_char('\r'), Some(LineEnding::CR));
    assert_eq!(LineEnding::from_char('\n'), Some(LineEnding::LF));
    assert_eq!(LineEnding::from_char('\u{2029}'), Some(LineEnding::PS));
    assert_eq!(LineEnding::from_char('h'), None);
    assert_eq!(LineEnding::Crlf.len_units(), 2);
  }

  #[test]
  fn units_to_line_ending() {
    let text = utf16("a\r\nb\rc");
    assert_eq!(LineEnding::from_units(&text, 1), Some(LineEnding::Crlf));
    assert_eq!(LineEnding::from_units(&text, 2), Some(LineEnding::LF));
    assert_eq!(LineEnding::from_units(&text, 4), Some(LineEnding::CR));
    assert_eq!(LineEnding::from_units(&text, 0), None);
    assert_eq!(LineEnding::from_units(&text, 99), None);
  }

  #[test]
  fn paragraphs_split_on_separators_only() {
    let text = utf16("one\u{2028}line\r\ntwo\u{2029}three\n");
    let ranges = paragraph_ranges(&text, 0..text.len());
    let pieces: Vec<String> = ranges
      .into_iter()
      .map(|r| String::from_utf16_lossy(&text[r]))
      .collect();
    assert_eq!(pieces, vec!["one\u{2028}line", "two", "three"]);
  }

  #[test]
  fn paragraphs_of_empty_range() {
    assert!(paragraph_ranges(&utf16("abc"), 1..1).is_empty());
    assert_eq!(paragraph_ranges(&utf16("\n\nx"), 0..3), vec![0..0, 1..1, 2..3]);
  }
}
