use the_string::StringError;
use thiserror::Error;

use crate::granularity::Granularity;

pub type Result<T> = std::result::Result<T, ChunkError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
  #[error("chunk clauses out of order")]
  BadChunkOrder,
  #[error("bad range start")]
  BadRangeStart,
  #[error("bad range end")]
  BadRangeEnd,
  #[error("bad expression")]
  BadExpression,
  #[error("bad destination")]
  BadDestination,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ResolutionErrorKind {
  #[error("no such object")]
  NoSuchObject,
  #[error("no such card")]
  NoSuchCard,
  #[error("no such background")]
  NoSuchBackground,
  #[error("no such stack")]
  NoSuchStack,
  #[error("object is not a container")]
  ObjectNotContainer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MarkErrorKind {
  #[error("cannot mark text")]
  CannotMark,
  #[error("bad text extents")]
  BadTextExtents,
}

/// Failures of the chunk layer. Every variant that comes from a clause names
/// the clause's granularity; `None` means the chunk as a whole.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ChunkError {
  #[error("{kind}{} at {position}", describe(*clause))]
  Parse {
    kind:     ParseErrorKind,
    clause:   Option<Granularity>,
    position: usize,
  },
  #[error("{kind}{}", describe(Some(*clause)))]
  Resolution {
    kind:   ResolutionErrorKind,
    clause: Granularity,
  },
  #[error("{kind}{}", describe(*clause))]
  Mark {
    kind:   MarkErrorKind,
    clause: Option<Granularity>,
  },
  #[error("chunk expressions nested deeper than {limit}")]
  RecursionLimit { limit: usize },
  #[error("{message}")]
  Evaluation { message: String },
  #[error(transparent)]
  String(#[from] StringError),
}

fn describe(clause: Option<Granularity>) -> String {
  clause.map_or_else(String::new, |clause| format!(" in {} clause", clause.name()))
}

impl ChunkError {
  pub(crate) fn parse(kind: ParseErrorKind, clause: Option<Granularity>, position: usize) -> Self {
    ChunkError::Parse {
      kind,
      clause,
      position,
    }
  }

  pub fn evaluation(message: impl Into<String>) -> Self {
    ChunkError::Evaluation {
      message: message.into(),
    }
  }

  /// Whether this failure means an object could not be found, as opposed
  /// to the chunk being malformed.
  pub fn is_resolution(&self) -> bool {
    matches!(self, ChunkError::Resolution { .. })
  }
}
