pub mod chunk;
pub mod config;
pub mod cref;
pub mod error;
pub mod expr;
pub mod granularity;
pub mod lexer;
pub mod mark;
pub mod mutate;
pub mod parser;
pub mod resolve;
pub mod value;

pub use chunk::{
  Chunk,
  Destination,
};
pub use config::{
  ChunkConfig,
  ConfigLoadError,
};
pub use cref::{
  Address,
  CRef,
  Ordinal,
};
pub use error::{
  ChunkError,
  MarkErrorKind,
  ParseErrorKind,
  ResolutionErrorKind,
  Result,
};
pub use granularity::Granularity;
pub use mark::{
  Container,
  MarkMode,
  Marked,
  MarkedText,
};
pub use mutate::Preposition;
pub use parser::{
  parse,
  parse_expression,
};
pub use resolve::{
  Engine,
  Evaluator,
  Host,
  Lookup,
  ObjectHandle,
  ObjectSpace,
};
pub use value::Value;
