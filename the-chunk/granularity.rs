//! The kinds of thing a chunk clause can address.
//!
//! Containers (stacks, cards, controls and so on) are looked up in the
//! object space. Text granularities split a string, and the order in which
//! they nest is the order of [`TEXT_ORDER`]: a clause may only be followed by
//! one that is strictly coarser.

use the_string::IndexSpace;

use crate::config::CharChunk;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
  Control,
  Field,
  Button,
  Image,
  Graphic,
  Scrollbar,
  Player,
}

impl ObjectKind {
  pub fn name(self) -> &'static str {
    match self {
      ObjectKind::Control => "control",
      ObjectKind::Field => "field",
      ObjectKind::Button => "button",
      ObjectKind::Image => "image",
      ObjectKind::Graphic => "graphic",
      ObjectKind::Scrollbar => "scrollbar",
      ObjectKind::Player => "player",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Granularity {
  Url,
  Stack,
  AudioClip,
  VideoClip,
  Background,
  Card,
  Group,
  Object(ObjectKind),
  Line,
  Paragraph,
  Sentence,
  Item,
  Word,
  TrueWord,
  Token,
  Character,
  Codepoint,
  Codeunit,
  Byte,
}

pub const TEXT_KINDS: usize = 11;

/// Text granularities from the outermost to the innermost.
pub const TEXT_ORDER: [Granularity; TEXT_KINDS] = [
  Granularity::Line,
  Granularity::Paragraph,
  Granularity::Sentence,
  Granularity::Item,
  Granularity::Word,
  Granularity::TrueWord,
  Granularity::Token,
  Granularity::Character,
  Granularity::Codepoint,
  Granularity::Codeunit,
  Granularity::Byte,
];

/// How a text granularity divides the string it is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Splitter {
  /// Separated by the configured line delimiter.
  Lines,
  /// Separated by the configured item delimiter.
  Items,
  /// Runs of non-space, with double quoted runs kept whole.
  Words,
  /// Tokens of the chunk expression lexer.
  Tokens,
  /// Segments of an index space of the string engine.
  Segments(IndexSpace),
}

impl Granularity {
  /// Nesting depth; a larger rank is finer.
  pub fn rank(self) -> u8 {
    match self {
      Granularity::Url => 0,
      Granularity::Stack => 1,
      Granularity::AudioClip | Granularity::VideoClip | Granularity::Background => 2,
      Granularity::Card => 3,
      Granularity::Group => 4,
      Granularity::Object(_) => 5,
      text => 10 + text.text_slot().map_or(0, |slot| slot as u8),
    }
  }

  #[inline]
  pub fn is_text(self) -> bool {
    self.text_slot().is_some()
  }

  /// Position in [`TEXT_ORDER`].
  pub fn text_slot(self) -> Option<usize> {
    TEXT_ORDER.iter().position(|&kind| kind == self)
  }

  /// Whether the clause may be followed by another clause of the same kind,
  /// as in `group 1 of group 2`.
  pub fn repeats(self) -> bool {
    matches!(
      self,
      Granularity::Stack | Granularity::Group | Granularity::Object(ObjectKind::Control)
    )
  }

  /// Whether `outer` may follow `self` in a chunk written inner-first.
  pub fn may_nest_in(self, outer: Granularity) -> bool {
    if self == outer {
      return self.repeats();
    }
    // A control nests in a group and groups nest in each other, so the
    // object kinds are interchangeable when chaining.
    if matches!(self, Granularity::Object(_)) && matches!(outer, Granularity::Object(ObjectKind::Control)) {
      return true;
    }
    outer.rank() < self.rank()
  }

  pub fn splitter(self, chars: CharChunk) -> Option<Splitter> {
    let splitter = match self {
      Granularity::Line => Splitter::Lines,
      Granularity::Item => Splitter::Items,
      Granularity::Word => Splitter::Words,
      Granularity::Token => Splitter::Tokens,
      Granularity::Paragraph => Splitter::Segments(IndexSpace::Paragraph),
      Granularity::Sentence => Splitter::Segments(IndexSpace::Sentence),
      Granularity::TrueWord => Splitter::Segments(IndexSpace::TrueWord),
      Granularity::Character => Splitter::Segments(chars.space()),
      Granularity::Codepoint => Splitter::Segments(IndexSpace::Codepoint),
      Granularity::Codeunit | Granularity::Byte => Splitter::Segments(IndexSpace::CodeUnit),
      _ => return None,
    };
    Some(splitter)
  }

  pub fn name(self) -> &'static str {
    match self {
      Granularity::Url => "url",
      Granularity::Stack => "stack",
      Granularity::AudioClip => "audioclip",
      Granularity::VideoClip => "videoclip",
      Granularity::Background => "background",
      Granularity::Card => "card",
      Granularity::Group => "group",
      Granularity::Object(kind) => kind.name(),
      Granularity::Line => "line",
      Granularity::Paragraph => "paragraph",
      Granularity::Sentence => "sentence",
      Granularity::Item => "item",
      Granularity::Word => "word",
      Granularity::TrueWord => "trueword",
      Granularity::Token => "token",
      Granularity::Character => "character",
      Granularity::Codepoint => "codepoint",
      Granularity::Codeunit => "codeunit",
      Granularity::Byte => "byte",
    }
  }

  /// The granularity a chunk keyword names, and whether it was the plural
  /// form. Keywords are matched without regard to case.
  pub fn from_keyword(word: &str) -> Option<(Granularity, bool)> {
    let lower = word.to_ascii_lowercase();
    let (singular, plural) = match lower.strip_suffix('s') {
      Some(stem) if Self::singular(stem).is_some() => (stem, true),
      _ => (lower.as_str(), false),
    };
    Self::singular(singular).map(|kind| (kind, plural))
  }

  fn singular(word: &str) -> Option<Granularity> {
    let kind = match word {
      "url" => Granularity::Url,
      "stack" => Granularity::Stack,
      "audioclip" | "ac" => Granularity::AudioClip,
      "videoclip" | "vc" => Granularity::VideoClip,
      "background" | "bg" | "bkgnd" => Granularity::Background,
      "card" | "cd" => Granularity::Card,
      "group" | "grp" => Granularity::Group,
      "control" => Granularity::Object(ObjectKind::Control),
      "field" | "fld" => Granularity::Object(ObjectKind::Field),
      "button" | "btn" => Granularity::Object(ObjectKind::Button),
      "image" | "img" => Granularity::Object(ObjectKind::Image),
      "graphic" | "grc" => Granularity::Object(ObjectKind::Graphic),
      "scrollbar" | "scrl" => Granularity::Object(ObjectKind::Scrollbar),
      "player" => Granularity::Object(ObjectKind::Player),
      "line" => Granularity::Line,
      "paragraph" => Granularity::Paragraph,
      "sentence" => Granularity::Sentence,
      "item" => Granularity::Item,
      "word" => Granularity::Word,
      "trueword" => Granularity::TrueWord,
      "token" => Granularity::Token,
      "character" | "char" => Granularity::Character,
      "codepoint" => Granularity::Codepoint,
      "codeunit" => Granularity::Codeunit,
      "byte" => Granularity::Byte,
      _ => return None,
    };
    Some(kind)
  }
}
