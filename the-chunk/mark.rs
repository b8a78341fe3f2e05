//! Marking: narrowing a string down to the range a chunk's text clauses
//! address.
//!
//! Clauses apply outermost first, each one inside the range the previous
//! one marked. Lines and items are found by searching for their delimiter,
//! words by walking spaces, tokens with the expression lexer, and every
//! finer granularity through the segments of the string engine.
//!
//! When marking for a write (`force`) an item or line past the end is made
//! to exist by inserting the missing delimiters; [`MarkedText::changed`]
//! counts the code units inserted. When marking for a delete
//! (`whole_chunk`) the range of the innermost clause grows to take one
//! adjacent delimiter with it.

use std::ops::Range;

use the_core::{
  chars::unit_is_space,
  unicode::Transcoded,
};
use the_string::{
  Segments,
  StringOptions,
  StringValue,
};
use tracing::trace;

use crate::{
  chunk::{
    Chunk,
    Destination,
  },
  config::ChunkConfig,
  cref::{
    Address,
    CRef,
    Ordinal,
  },
  error::{
    ChunkError,
    MarkErrorKind,
    ParseErrorKind,
    ResolutionErrorKind,
    Result,
  },
  expr::{
    Expr,
    Ident,
  },
  granularity::{
    Granularity,
    ObjectKind,
    Splitter,
  },
  lexer,
  resolve::{
    Engine,
    Host,
    ObjectHandle,
  },
};

const QUOTE: u16 = b'"' as u16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MarkMode {
  /// Insert missing line and item delimiters.
  pub force:       bool,
  /// Include a delimiter next to the innermost chunk.
  pub whole_chunk: bool,
}

impl MarkMode {
  pub const READ: MarkMode = MarkMode {
    force:       false,
    whole_chunk: false,
  };
  pub const WRITE: MarkMode = MarkMode {
    force:       true,
    whole_chunk: false,
  };
  pub const DELETE: MarkMode = MarkMode {
    force:       true,
    whole_chunk: true,
  };
}

/// A code unit range of a string.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkedText {
  pub text:    StringValue,
  pub start:   usize,
  pub finish:  usize,
  /// Code units inserted while marking.
  pub changed: usize,
}

impl MarkedText {
  pub fn whole(text: StringValue) -> Self {
    let finish = text.len();
    Self {
      text,
      start: 0,
      finish,
      changed: 0,
    }
  }

  pub fn range(&self) -> Range<usize> {
    self.start..self.finish
  }

  /// The marked part of the text.
  pub fn substring(&self) -> Result<StringValue> {
    Ok(self.text.substring(self.range())?)
  }
}

/// Where the marked text came from, so that edits can be stored back.
#[derive(Debug, Clone, PartialEq)]
pub enum Container {
  Variable(Ident),
  Object {
    object: ObjectHandle,
    kind:   Granularity,
  },
  Url(String),
  /// A computed value, which cannot be written to.
  Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marked {
  pub container: Container,
  pub text:      MarkedText,
}

/// The first chunk and number of chunks a clause asks for, before the text
/// is looked at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Extent {
  Ordinal(Ordinal),
  Range(i64, i64),
  Index(i64),
}

impl Extent {
  fn needs_count(self) -> bool {
    match self {
      Extent::Ordinal(Ordinal::Nth(_)) => false,
      Extent::Ordinal(_) => true,
      Extent::Range(start, end) => start < 0 || end < 0,
      Extent::Index(index) => index < 0,
    }
  }
}

impl<H: Host + ?Sized> Engine<'_, H> {
  /// Marks the text `chunk` addresses. A chunk without text clauses marks
  /// the whole of its container.
  pub fn mark(&mut self, chunk: &Chunk, mode: MarkMode) -> Result<Marked> {
    self.nested(|engine| engine.mark_chunk(chunk, mode))
  }

  fn mark_chunk(&mut self, chunk: &Chunk, mode: MarkMode) -> Result<Marked> {
    let (container, mut marked) = match &chunk.destination {
      Destination::Nested(inner) if !chunk.has_containers() => {
        let inner_mode = MarkMode {
          whole_chunk: false,
          ..mode
        };
        let Marked { container, text } = self.mark(inner, inner_mode)?;
        (container, text)
      },
      _ => {
        let (container, text) = self.source(chunk)?;
        (container, MarkedText::whole(text))
      },
    };

    let innermost = chunk.text.innermost();
    for cref in chunk.text.iter() {
      let whole = mode.whole_chunk && Some(cref.kind) == innermost;
      self.mark_clause(&mut marked, cref, mode.force, whole)?;
    }
    Ok(Marked {
      container,
      text: marked,
    })
  }

  /// The container of a chunk and its current text.
  fn source(&mut self, chunk: &Chunk) -> Result<(Container, StringValue)> {
    let object_kind = |chunk: &Chunk| {
      chunk
        .innermost_container()
        .map_or(Granularity::Object(ObjectKind::Control), |cref| cref.kind)
    };

    match &chunk.destination {
      _ if chunk.has_containers() => self.object_source(chunk, object_kind(chunk)),
      Destination::Me | Destination::Target | Destination::OwnerOf(_) | Destination::Nested(_) => {
        self.object_source(chunk, object_kind(chunk))
      },
      Destination::Variable(name) => {
        let text = match self.host.variable(name) {
          Some(value) => self.value_text(&value)?,
          None => StringValue::empty(),
        };
        Ok((Container::Variable(name.clone()), text))
      },
      Destination::Expression(expr) => {
        let value = self.evaluate(expr)?;
        Ok((Container::Value, self.value_text(&value)?))
      },
      Destination::Url(expr) => {
        let value = self.evaluate(expr)?;
        let url = self.value_text(&value)?.to_string();
        let text = self.host.url(&url).unwrap_or_default();
        Ok((Container::Url(url), text))
      },
      Destination::Containers => Err(ChunkError::parse(
        ParseErrorKind::BadDestination,
        None,
        chunk.position,
      )),
    }
  }

  fn object_source(&mut self, chunk: &Chunk, kind: Granularity) -> Result<(Container, StringValue)> {
    let object = self.get_object(chunk)?;
    let text = self.host.text(object).ok_or(ChunkError::Resolution {
      kind:   ResolutionErrorKind::ObjectNotContainer,
      clause: kind,
    })?;
    Ok((Container::Object { object, kind }, text))
  }

  fn mark_clause(&mut self, marked: &mut MarkedText, cref: &CRef, force: bool, whole: bool) -> Result<()> {
    let splitter = cref
      .kind
      .splitter(self.config.char_chunk)
      .ok_or(ChunkError::Mark {
        kind:   MarkErrorKind::CannotMark,
        clause: Some(cref.kind),
      })?;

    let extent = self.extent(cref)?;
    let count = if extent.needs_count() {
      count_chunks(&marked.text, marked.range(), splitter, &self.config)
    } else {
      0
    };
    let (first, number) = match extent {
      Extent::Ordinal(ordinal) => (self.ordinal_index(ordinal, count) as i64, 1),
      Extent::Range(start, end) => {
        let count = count as i64;
        let start = if start < 0 { start + count } else { start - 1 };
        let end = if end < 0 { end + count + 1 } else { end };
        (start, end - start)
      },
      Extent::Index(index) => {
        let start = if index < 0 { index + count as i64 } else { index - 1 };
        (start, 1)
      },
    };
    let (first, number) = if first < 0 { (0, number + first) } else { (first, number) };
    let (first, number) = (first as usize, number.max(0) as usize);

    trace!(clause = cref.kind.name(), first, number, "marking");
    mark_step(marked, splitter, first, number, force, whole, &self.config)
  }

  fn extent(&mut self, cref: &CRef) -> Result<Extent> {
    let extent = match &cref.address {
      Address::Ordinal(ordinal) => Extent::Ordinal(*ordinal),
      Address::Range { start, end } => Extent::Range(
        self.index(start, cref, ParseErrorKind::BadRangeStart)?,
        self.index(end, cref, ParseErrorKind::BadRangeEnd)?,
      ),
      Address::Expression(expr) => Extent::Index(self.index(expr, cref, ParseErrorKind::BadExpression)?),
      Address::Id(_) | Address::This => {
        return Err(ChunkError::Mark {
          kind:   MarkErrorKind::BadTextExtents,
          clause: Some(cref.kind),
        });
      },
    };
    Ok(extent)
  }

  /// Evaluates a clause index, which must be an integer.
  fn index(&mut self, expr: &Expr, cref: &CRef, error: ParseErrorKind) -> Result<i64> {
    let value = self.evaluate(expr)?;
    match self.value_number(&value) {
      Some(number) if number.fract() == 0.0 && number.abs() < i64::MAX as f64 => Ok(number as i64),
      _ => Err(ChunkError::parse(error, Some(cref.kind), cref.position)),
    }
  }
}

/// The number of chunks `splitter` divides `within` into. Empty text has
/// no chunks of any kind.
pub fn count_chunks(
  text: &StringValue,
  within: Range<usize>,
  splitter: Splitter,
  config: &ChunkConfig,
) -> usize {
  if within.is_empty() {
    return 0;
  }
  match splitter {
    Splitter::Lines => count_delimited(text, within, &config.line_delimiter, config.options()),
    Splitter::Items => count_delimited(text, within, &config.item_delimiter, config.options()),
    Splitter::Words => count_words(&text.chars(), within, config.line_delimiter.char_at(0)),
    Splitter::Tokens => token_segments(text, within).count(),
    Splitter::Segments(space) => text.segments(space, within).count(),
  }
}

/// Narrows `marked` to `count` chunks starting at chunk `first`, both zero
/// based.
pub fn mark_step(
  marked: &mut MarkedText,
  splitter: Splitter,
  first: usize,
  count: usize,
  force: bool,
  whole: bool,
  config: &ChunkConfig,
) -> Result<()> {
  let within = marked.range();
  let range = match splitter {
    Splitter::Lines | Splitter::Items => {
      let delimiter = match splitter {
        Splitter::Lines => &config.line_delimiter,
        _ => &config.item_delimiter,
      };
      return mark_delimited(marked, delimiter, config.options(), first, count, force, whole);
    },
    Splitter::Words => {
      let line = config.line_delimiter.char_at(0);
      mark_words(&marked.text.chars(), within, first, count, whole, line)
    },
    Splitter::Tokens => token_segments(&marked.text, within).map(first..first.saturating_add(count)),
    Splitter::Segments(space) => marked.text.segments(space, within).map(first..first.saturating_add(count)),
  };
  marked.start = range.start;
  marked.finish = range.end;
  Ok(())
}

fn count_delimited(
  text: &StringValue,
  within: Range<usize>,
  delimiter: &StringValue,
  options: StringOptions,
) -> usize {
  let mut count = 1;
  let mut at = within.start;
  while let Some(found) = text.find_in(at..within.end, delimiter, options) {
    if found.end >= within.end || found.is_empty() {
      break;
    }
    count += 1;
    at = found.end;
  }
  count
}

fn mark_delimited(
  marked: &mut MarkedText,
  delimiter: &StringValue,
  options: StringOptions,
  first: usize,
  count: usize,
  force: bool,
  whole: bool,
) -> Result<()> {
  let text = &marked.text;
  let within = marked.range();
  let end = within.end;

  let mut at = within.start;
  let mut leading: Option<Range<usize>> = None;
  let mut missing = 0;
  for remaining in (0..first).rev() {
    match text.find_in(at..end, delimiter, options) {
      Some(found) => {
        at = found.end;
        leading = Some(found);
      },
      None if at < end => {
        at = end;
        leading = None;
      },
      None => {},
    }
    if at == end && !(remaining == 0 && leading.is_some()) {
      missing += 1;
    }
  }

  let mut start = at;
  let mut finish = at;
  let mut trailing = None;
  if count > 0 {
    finish = end;
    for remaining in (0..count).rev() {
      if at >= end {
        break;
      }
      match text.find_in(at..end, delimiter, options) {
        Some(found) if remaining > 0 => at = found.end,
        Some(found) => {
          finish = found.start;
          trailing = Some(found);
        },
        None => break,
      }
    }
  }

  if whole {
    if let Some(trailing) = trailing {
      finish = trailing.end;
    } else if start > within.start && missing == 0
      && let Some(leading) = leading
    {
      start = leading.start;
    }
  } else if force && missing > 0 {
    let mut padded = text.mutable_copy();
    padded.pad(start, missing, delimiter)?;
    let inserted = missing * delimiter.len();
    trace!(count = missing, at = start, "inserted missing delimiters");
    marked.text = padded.into_value();
    marked.changed += inserted;
    start += inserted;
    finish += inserted;
  }

  marked.start = start;
  marked.finish = finish;
  Ok(())
}

fn skip_spaces(units: &[u16], mut at: usize, end: usize) -> usize {
  while at < end && unit_is_space(units[at]) {
    at += 1;
  }
  at
}

/// Skips one word. A word that opens with a double quote runs through the
/// closing quote, or through the line delimiter when there is none.
fn skip_word(units: &[u16], mut at: usize, end: usize, line: Option<u16>) -> usize {
  if at < end && units[at] == QUOTE {
    at += 1;
    while at < end && units[at] != QUOTE && Some(units[at]) != line {
      at += 1;
    }
    return (at + 1).min(end);
  }
  while at < end && !unit_is_space(units[at]) {
    at += 1;
  }
  at
}

fn count_words(units: &[u16], within: Range<usize>, line: Option<u16>) -> usize {
  let end = within.end;
  let mut count = 0;
  let mut at = skip_spaces(units, within.start, end);
  while at < end {
    count += 1;
    at = skip_word(units, at, end, line);
    at = skip_spaces(units, at, end);
  }
  count
}

fn mark_words(
  units: &[u16],
  within: Range<usize>,
  first: usize,
  count: usize,
  whole: bool,
  line: Option<u16>,
) -> Range<usize> {
  let end = within.end;
  let mut at = skip_spaces(units, within.start, end);
  for _ in 0..first {
    if at >= end {
      break;
    }
    at = skip_word(units, at, end, line);
    at = skip_spaces(units, at, end);
  }
  let mut start = at;
  if count == 0 {
    return start..start;
  }

  for n in 0..count {
    if at >= end {
      break;
    }
    at = skip_word(units, at, end, line);
    if n + 1 < count {
      at = skip_spaces(units, at, end);
    }
  }

  let mut finish = at;
  if whole {
    finish = skip_spaces(units, finish, end);
    if finish == end {
      while start > within.start && unit_is_space(units[start - 1]) {
        start -= 1;
      }
    }
  } else {
    while finish > start && unit_is_space(units[finish - 1]) {
      finish -= 1;
    }
  }
  start..finish
}

/// Tokens of the expression language, as code unit spans of `within`.
fn token_segments(text: &StringValue, within: Range<usize>) -> Segments {
  let units = text.chars();
  let transcoded = Transcoded::from_units(&units[within.clone()]);
  let spans = lexer::token_spans(transcoded.as_str())
    .into_iter()
    .map(|span| {
      within.start + transcoded.unit_offset(span.start)..within.start + transcoded.unit_offset(span.end)
    })
    .collect();
  Segments::Spans {
    spans,
    end: within.end,
  }
}
