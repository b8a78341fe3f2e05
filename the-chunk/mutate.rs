//! Reading and writing through chunk expressions.

use the_string::StringValue;
use tracing::debug;

use crate::{
  chunk::{
    Chunk,
    Destination,
  },
  error::{
    ChunkError,
    MarkErrorKind,
    ParseErrorKind,
    ResolutionErrorKind,
    Result,
  },
  granularity::Granularity,
  mark::{
    Container,
    MarkMode,
    Marked,
    count_chunks,
  },
  resolve::{
    Engine,
    Host,
    missing,
  },
  value::Value,
};

/// Where `put` places its value relative to the marked range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preposition {
  Before,
  Into,
  After,
}

impl<H: Host + ?Sized> Engine<'_, H> {
  /// The value `chunk` addresses. `byte` chunks read as data, every other
  /// text chunk as text.
  pub fn get(&mut self, chunk: &Chunk) -> Result<Value> {
    if !chunk.is_text_chunk() {
      return self.get_whole(chunk);
    }
    let marked = self.mark(chunk, MarkMode::READ)?;
    let text = marked.text.substring()?;
    if chunk.text.innermost() == Some(Granularity::Byte) {
      return Ok(Value::Data(text.to_native_chars()));
    }
    Ok(Value::Text(text))
  }

  fn get_whole(&mut self, chunk: &Chunk) -> Result<Value> {
    match &chunk.destination {
      Destination::Variable(name) if !chunk.has_containers() => {
        Ok(self.host.variable(name).unwrap_or_default())
      },
      Destination::Expression(expr) if !chunk.has_containers() => self.evaluate(expr),
      Destination::Nested(inner) if !chunk.has_containers() => self.get(inner),
      Destination::Url(_) => Ok(Value::Text(self.mark(chunk, MarkMode::READ)?.text.text)),
      _ => {
        let object = self.get_object(chunk)?;
        match self.host.text(object) {
          Some(text) => Ok(Value::Text(text)),
          None => Ok(Value::Object(object)),
        }
      },
    }
  }

  /// Splices `value` into the text `chunk` addresses and stores the result
  /// back into its container. Missing lines and items are created.
  pub fn put(&mut self, value: &Value, preposition: Preposition, chunk: &Chunk) -> Result<()> {
    let replacement = self.value_text(value)?;
    let Marked { container, text } = self.mark(chunk, MarkMode::WRITE)?;
    let range = match preposition {
      Preposition::Before => text.start..text.start,
      Preposition::Into => text.range(),
      Preposition::After => text.finish..text.finish,
    };
    let mut edited = text.text.mutable_copy();
    edited.replace(range, &replacement)?;
    self.store(chunk, &container, edited.into_value())
  }

  /// Removes the text `chunk` addresses together with one adjacent
  /// delimiter. A chunk naming an object deletes the object.
  pub fn delete(&mut self, chunk: &Chunk) -> Result<()> {
    let names_object = chunk.has_containers()
      || matches!(
        chunk.destination,
        Destination::Me | Destination::Target | Destination::OwnerOf(_)
      );
    if !chunk.is_text_chunk() && names_object {
      let object = self.get_object(chunk)?;
      if !self.host.delete(object) {
        return Err(ChunkError::Mark {
          kind:   MarkErrorKind::CannotMark,
          clause: chunk.innermost_container().map(|cref| cref.kind),
        });
      }
      debug!(object = object.0, "deleted object");
      return Ok(());
    }

    let Marked { container, text } = self.mark(chunk, MarkMode::DELETE)?;
    let mut edited = text.text.mutable_copy();
    edited.remove(text.range())?;
    self.store(chunk, &container, edited.into_value())
  }

  /// The number of chunks of `kind` in `of`. Text kinds are counted in the
  /// text `of` addresses; containers are counted by the object space,
  /// inside the object `of` names or the current stack or card.
  pub fn count(&mut self, kind: Granularity, of: Option<&Chunk>) -> Result<usize> {
    if let Some(splitter) = kind.splitter(self.config.char_chunk) {
      let Some(chunk) = of else {
        return Err(ChunkError::parse(ParseErrorKind::BadDestination, Some(kind), 0));
      };
      let marked = self.mark(chunk, MarkMode::READ)?;
      return Ok(count_chunks(&marked.text.text, marked.text.range(), splitter, &self.config));
    }

    let parent = match of {
      Some(chunk) => Some(self.get_object(chunk)?),
      None => match kind {
        Granularity::Url | Granularity::Stack => None,
        Granularity::Card | Granularity::Background | Granularity::AudioClip | Granularity::VideoClip => {
          Some(self.host.this(Granularity::Stack).ok_or_else(|| missing(Granularity::Stack))?)
        },
        _ => Some(self.host.this(Granularity::Card).ok_or_else(|| missing(Granularity::Card))?),
      },
    };
    Ok(self.host.count(parent, kind))
  }

  fn store(&mut self, chunk: &Chunk, container: &Container, text: StringValue) -> Result<()> {
    match container {
      Container::Variable(name) => {
        self.host.set_variable(name, Value::Text(text));
        Ok(())
      },
      Container::Object { object, kind } => {
        if self.host.set_text(*object, text) {
          Ok(())
        } else {
          Err(ChunkError::Resolution {
            kind:   ResolutionErrorKind::ObjectNotContainer,
            clause: *kind,
          })
        }
      },
      Container::Url(url) => {
        if self.host.set_url(url, text) {
          Ok(())
        } else {
          Err(ChunkError::Resolution {
            kind:   ResolutionErrorKind::ObjectNotContainer,
            clause: Granularity::Url,
          })
        }
      },
      Container::Value => Err(ChunkError::parse(
        ParseErrorKind::BadDestination,
        None,
        chunk.position,
      )),
    }
  }
}
