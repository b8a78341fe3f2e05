use std::collections::TryReserveError;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StringError>;

/// Failures of the string engine. Every operation that reports one leaves
/// the string it was called on exactly as it was.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum StringError {
  #[error("string allocation failed")]
  AllocationFailure,
  #[error("requested length of {requested} code units cannot be represented")]
  Overflow { requested: usize },
  #[error("bad format directive at offset {position}")]
  BadFormat { position: usize },
}

impl From<TryReserveError> for StringError {
  fn from(_: TryReserveError) -> Self {
    StringError::AllocationFailure
  }
}
