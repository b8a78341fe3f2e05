//! A parsed chunk expression.
//!
//! A [`Chunk`] holds what the expression is applied to (its
//! [`Destination`]), the container clauses that locate an object, and at
//! most one clause per text granularity. Clauses are stored outermost first
//! regardless of the order they were written in.

use crate::{
  cref::CRef,
  expr::{
    Expr,
    Ident,
  },
  granularity::{
    Granularity,
    TEXT_KINDS,
  },
};

#[derive(Debug, Clone, PartialEq)]
pub enum Destination {
  /// Located by the container clauses alone, starting from the default
  /// stack and card.
  Containers,
  Variable(Ident),
  Expression(Expr),
  /// A parenthesized chunk whose marked text the outer clauses apply to.
  Nested(Box<Chunk>),
  Me,
  Target,
  OwnerOf(Box<Chunk>),
  Url(Expr),
}

/// The text clauses of a chunk, one slot per granularity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextRefs([Option<CRef>; TEXT_KINDS]);

impl TextRefs {
  pub fn get(&self, kind: Granularity) -> Option<&CRef> {
    self.0.get(kind.text_slot()?)?.as_ref()
  }

  /// Stores `cref` in its slot, returning the clause it replaced.
  pub fn insert(&mut self, cref: CRef) -> Option<CRef> {
    let slot = cref.kind.text_slot()?;
    self.0[slot].replace(cref)
  }

  /// The clauses from the outermost to the innermost.
  pub fn iter(&self) -> impl Iterator<Item = &CRef> {
    self.0.iter().flatten()
  }

  pub fn is_empty(&self) -> bool {
    self.0.iter().all(Option::is_none)
  }

  pub fn innermost(&self) -> Option<Granularity> {
    self.iter().last().map(|cref| cref.kind)
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
  pub destination: Destination,
  /// Outermost first; later stacks are substacks of earlier ones.
  pub stacks:      Vec<CRef>,
  pub background:  Option<CRef>,
  pub card:        Option<CRef>,
  /// Outermost first.
  pub groups:      Vec<CRef>,
  /// Outermost first.
  pub objects:     Vec<CRef>,
  /// An audio or video clip of the stack.
  pub clip:        Option<CRef>,
  pub text:        TextRefs,
  /// Byte offset of the expression in the parsed source.
  pub position:    usize,
}

impl Chunk {
  pub fn new(destination: Destination) -> Self {
    Self {
      destination,
      stacks: Vec::new(),
      background: None,
      card: None,
      groups: Vec::new(),
      objects: Vec::new(),
      clip: None,
      text: TextRefs::default(),
      position: 0,
    }
  }

  pub fn has_containers(&self) -> bool {
    !self.stacks.is_empty()
      || self.background.is_some()
      || self.card.is_some()
      || !self.groups.is_empty()
      || !self.objects.is_empty()
      || self.clip.is_some()
  }

  /// Whether the chunk addresses a range of text rather than a whole
  /// container.
  pub fn is_text_chunk(&self) -> bool {
    !self.text.is_empty()
  }

  /// The finest container clause, which names the object the chunk
  /// resolves to.
  pub fn innermost_container(&self) -> Option<&CRef> {
    self
      .objects
      .last()
      .or(self.groups.last())
      .or(self.clip.as_ref())
      .or(self.card.as_ref())
      .or(self.background.as_ref())
      .or(self.stacks.last())
  }

  /// Adds a clause written after the ones already present, so one that is
  /// further out.
  pub(crate) fn push_outer(&mut self, cref: CRef) {
    match cref.kind {
      Granularity::Stack => self.stacks.insert(0, cref),
      Granularity::Background => self.background = Some(cref),
      Granularity::Card => self.card = Some(cref),
      Granularity::Group => self.groups.insert(0, cref),
      Granularity::Object(_) => self.objects.insert(0, cref),
      Granularity::AudioClip | Granularity::VideoClip => self.clip = Some(cref),
      Granularity::Url => {},
      _ => {
        self.text.insert(cref);
      },
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    cref::{
      Address,
      Ordinal,
    },
    granularity::ObjectKind,
  };

  fn cref(kind: Granularity) -> CRef {
    CRef::new(kind, Address::Ordinal(Ordinal::Nth(0)), 0)
  }

  #[test]
  fn text_refs_iterate_outer_to_inner() {
    let mut refs = TextRefs::default();
    assert!(refs.is_empty());
    refs.insert(cref(Granularity::Character));
    refs.insert(cref(Granularity::Line));
    refs.insert(cref(Granularity::Word));
    let kinds: Vec<_> = refs.iter().map(|cref| cref.kind).collect();
    assert_eq!(kinds, [Granularity::Line, Granularity::Word, Granularity::Character]);
    assert_eq!(refs.innermost(), Some(Granularity::Character));
    assert!(refs.get(Granularity::Word).is_some());
    assert!(refs.get(Granularity::Item).is_none());
    assert!(refs.insert(cref(Granularity::Card)).is_none());
  }

  #[test]
  fn containers_are_stored_outermost_first() {
    let mut chunk = Chunk::new(Destination::Containers);
    let button = Granularity::Object(ObjectKind::Button);
    for kind in [button, Granularity::Group, Granularity::Group, Granularity::Card] {
      let mut clause = cref(kind);
      clause.position = chunk.groups.len();
      chunk.push_outer(clause);
    }
    assert!(chunk.has_containers());
    assert!(!chunk.is_text_chunk());
    assert_eq!(chunk.groups.len(), 2);
    assert_eq!(chunk.groups[0].position, 1);
    assert_eq!(chunk.innermost_container().map(|cref| cref.kind), Some(button));
  }
}
