use smartstring::{
  LazyCompact,
  SmartString,
};
use the_string::StringValue;

use crate::{
  chunk::Chunk,
  error::{
    ChunkError,
    Result,
  },
  granularity::Granularity,
};

pub type Ident = SmartString<LazyCompact>;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
  Text(StringValue),
  Number(f64),
  /// A bare word. Evaluates to the variable's value, or to the word itself
  /// when no such variable exists.
  Variable(Ident),
  Negate(Box<Expr>),
  Binary {
    op:  BinaryOp,
    lhs: Box<Expr>,
    rhs: Box<Expr>,
  },
  /// A chunk used as a value, such as `word 2 of x` or `me`.
  Chunk(Box<Chunk>),
  /// `the <name>` or `the <name> of <chunk>`.
  Property {
    name: Ident,
    of:   Option<Box<Chunk>>,
  },
  Function {
    name: Ident,
    args: Vec<Expr>,
  },
  /// `the number of <kinds> [of <chunk>]`.
  Count {
    kind: Granularity,
    of:   Option<Box<Chunk>>,
  },
}

impl Expr {
  pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
    Expr::Binary {
      op,
      lhs: Box::new(lhs),
      rhs: Box::new(rhs),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
  Add,
  Subtract,
  Multiply,
  Divide,
  /// `div`, division truncated toward zero.
  IntDivide,
  Modulo,
  Concat,
  /// `&&`, concatenation with a space between.
  ConcatSpace,
}

impl BinaryOp {
  /// The operator an operator token or keyword spells.
  pub fn from_token(text: &str) -> Option<Self> {
    let op = match text {
      "+" => BinaryOp::Add,
      "-" => BinaryOp::Subtract,
      "*" => BinaryOp::Multiply,
      "/" => BinaryOp::Divide,
      "&" => BinaryOp::Concat,
      "&&" => BinaryOp::ConcatSpace,
      word if word.eq_ignore_ascii_case("div") => BinaryOp::IntDivide,
      word if word.eq_ignore_ascii_case("mod") => BinaryOp::Modulo,
      _ => return None,
    };
    Some(op)
  }

  /// Binding strength; higher binds tighter.
  pub fn precedence(self) -> u8 {
    match self {
      BinaryOp::Concat | BinaryOp::ConcatSpace => 1,
      BinaryOp::Add | BinaryOp::Subtract => 2,
      BinaryOp::Multiply | BinaryOp::Divide | BinaryOp::IntDivide | BinaryOp::Modulo => 3,
    }
  }

  pub fn is_concat(self) -> bool {
    matches!(self, BinaryOp::Concat | BinaryOp::ConcatSpace)
  }

  pub fn arithmetic(self, lhs: f64, rhs: f64) -> Result<f64> {
    let divisor = |rhs: f64| {
      if rhs == 0.0 {
        Err(ChunkError::evaluation("division by zero"))
      } else {
        Ok(rhs)
      }
    };
    let result = match self {
      BinaryOp::Add => lhs + rhs,
      BinaryOp::Subtract => lhs - rhs,
      BinaryOp::Multiply => lhs * rhs,
      BinaryOp::Divide => lhs / divisor(rhs)?,
      BinaryOp::IntDivide => (lhs / divisor(rhs)?).trunc(),
      BinaryOp::Modulo => lhs % divisor(rhs)?,
      BinaryOp::Concat | BinaryOp::ConcatSpace => {
        return Err(ChunkError::evaluation("concatenation is not arithmetic"));
      },
    };
    Ok(result)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn arithmetic() {
    assert_eq!(BinaryOp::Add.arithmetic(2.0, 3.0), Ok(5.0));
    assert_eq!(BinaryOp::IntDivide.arithmetic(-7.0, 2.0), Ok(-3.0));
    assert_eq!(BinaryOp::Modulo.arithmetic(7.0, 3.0), Ok(1.0));
    assert_eq!(
      BinaryOp::Divide.arithmetic(1.0, 0.0),
      Err(ChunkError::evaluation("division by zero"))
    );
  }

  #[test]
  fn operator_spelling() {
    assert_eq!(BinaryOp::from_token("DIV"), Some(BinaryOp::IntDivide));
    assert_eq!(BinaryOp::from_token("&&"), Some(BinaryOp::ConcatSpace));
    assert_eq!(BinaryOp::from_token("="), None);
    assert!(BinaryOp::Multiply.precedence() > BinaryOp::Add.precedence());
    assert!(BinaryOp::Add.precedence() > BinaryOp::Concat.precedence());
  }
}
