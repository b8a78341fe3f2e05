use crate::{
  expr::Expr,
  granularity::Granularity,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ordinal {
  /// `first` through `tenth`, zero based.
  Nth(u8),
  Last,
  /// The element at `count / 2`, so the earlier one of an even count.
  Middle,
  Any,
}

impl Ordinal {
  pub fn from_keyword(word: &str) -> Option<Self> {
    const NTH: [&str; 10] = [
      "first", "second", "third", "fourth", "fifth", "sixth", "seventh", "eighth", "ninth", "tenth",
    ];
    let lower = word.to_ascii_lowercase();
    if let Some(idx) = NTH.iter().position(|&nth| nth == lower) {
      return Some(Ordinal::Nth(idx as u8));
    }
    match lower.as_str() {
      "last" => Some(Ordinal::Last),
      "middle" | "mid" => Some(Ordinal::Middle),
      "any" => Some(Ordinal::Any),
      _ => None,
    }
  }
}

/// How a clause picks among the chunks of its kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Address {
  Ordinal(Ordinal),
  /// `start to end`, both inclusive and one based. Negative values count
  /// from the end.
  Range { start: Expr, end: Expr },
  /// `id <expr>`.
  Id(Expr),
  /// A number, or for containers a name.
  Expression(Expr),
  /// `this card`, `this stack`.
  This,
}

/// One clause of a chunk expression.
#[derive(Debug, Clone, PartialEq)]
pub struct CRef {
  pub kind:     Granularity,
  pub address:  Address,
  /// `card` or `background` before an object kind, as in `bg field 1`.
  pub parent:   Option<Granularity>,
  /// Byte offset of the clause in the parsed source.
  pub position: usize,
}

impl CRef {
  pub fn new(kind: Granularity, address: Address, position: usize) -> Self {
    Self {
      kind,
      address,
      parent: None,
      position,
    }
  }
}
