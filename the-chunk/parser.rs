//! Recursive descent parser for chunk expressions.
//!
//! Clauses are written inner-first (`word 2 of line 3 of field 1`) and each
//! must be coarser than the one before it. Whatever follows the last `of`
//! that is not a clause is the destination: `me`, `the target`, `the owner
//! of <chunk>`, a `url`, a parenthesized chunk, or a single factor such as a
//! variable or a literal.
//!
//! Where the token stream could be read more than one way the parser tries
//! the structural reading first and backs up to the expression reading when
//! that fails.

use the_string::StringValue;

use crate::{
  chunk::{
    Chunk,
    Destination,
  },
  cref::{
    Address,
    CRef,
    Ordinal,
  },
  error::{
    ChunkError,
    ParseErrorKind,
    Result,
  },
  expr::{
    BinaryOp,
    Expr,
    Ident,
  },
  granularity::Granularity,
  lexer::{
    Token,
    TokenKind,
    tokenize,
  },
};

/// Deepest nesting of parentheses and sub-chunks the parser accepts.
pub const MAX_NESTING: usize = 256;

const RESERVED: [&str; 11] = [
  "of", "in", "to", "thru", "through", "id", "into", "before", "after", "div", "mod",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
  /// The address of a clause. Bare chunks are not values here, so that
  /// `line x of y` stops before `of`.
  Clause,
  Value,
}

/// Parses `input` as a single chunk expression.
pub fn parse(input: &str) -> Result<Chunk> {
  let mut parser = Parser::new(input)?;
  let chunk = parser.parse_chunk()?;
  parser.expect_end()?;
  Ok(chunk)
}

/// Parses `input` as an expression, which may contain chunks.
pub fn parse_expression(input: &str) -> Result<Expr> {
  let mut parser = Parser::new(input)?;
  let expr = parser.parse_expr()?;
  parser.expect_end()?;
  Ok(expr)
}

pub struct Parser<'a> {
  input:    &'a str,
  tokens:   Vec<Token<'a>>,
  idx:      usize,
  depth:    usize,
  /// Opening parentheses already known not to hold a structural chunk.
  no_chunk: Vec<bool>,
}

impl<'a> Parser<'a> {
  pub fn new(input: &'a str) -> Result<Self> {
    let tokens = tokenize(input, true)?;
    Ok(Self {
      input,
      no_chunk: vec![false; tokens.len()],
      tokens,
      idx: 0,
      depth: 0,
    })
  }

  /// Byte offset of the next token, or the end of the input.
  pub fn position(&self) -> usize {
    self.peek().map_or(self.input.len(), |token| token.span.start)
  }

  pub fn is_at_end(&self) -> bool {
    self.idx >= self.tokens.len()
  }

  pub fn expect_end(&self) -> Result<()> {
    if self.is_at_end() {
      Ok(())
    } else {
      Err(ChunkError::parse(ParseErrorKind::BadExpression, None, self.position()))
    }
  }

  fn peek(&self) -> Option<&Token<'a>> {
    self.tokens.get(self.idx)
  }

  fn peek_at(&self, offset: usize) -> Option<&Token<'a>> {
    self.tokens.get(self.idx + offset)
  }

  fn bump(&mut self) {
    self.idx += 1;
  }

  fn at_word(&self, keyword: &str) -> bool {
    self.peek().is_some_and(|token| token.is_word(keyword))
  }

  fn eat_word(&mut self, keyword: &str) -> bool {
    let found = self.at_word(keyword);
    if found {
      self.bump();
    }
    found
  }

  fn eat_kind(&mut self, kind: TokenKind) -> bool {
    let found = self.peek().is_some_and(|token| token.kind == kind);
    if found {
      self.bump();
    }
    found
  }

  fn eat_connector(&mut self) -> bool {
    self.eat_word("of") || self.eat_word("in")
  }

  fn eat_range_word(&mut self) -> bool {
    self.eat_word("to") || self.eat_word("thru") || self.eat_word("through")
  }

  /// The singular granularity keyword at `offset`, if any.
  fn granularity_at(&self, offset: usize) -> Option<Granularity> {
    let token = self.peek_at(offset)?;
    if token.kind != TokenKind::Word {
      return None;
    }
    match Granularity::from_keyword(token.content)? {
      (kind, false) => Some(kind),
      (_, true) => None,
    }
  }

  fn ordinal_at(&self, offset: usize) -> Option<Ordinal> {
    let token = self.peek_at(offset)?;
    if token.kind != TokenKind::Word {
      return None;
    }
    Ordinal::from_keyword(token.content)
  }

  fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
    if self.depth >= MAX_NESTING {
      return Err(ChunkError::RecursionLimit { limit: MAX_NESTING });
    }
    self.depth += 1;
    let result = f(self);
    self.depth -= 1;
    result
  }

  pub fn parse_chunk(&mut self) -> Result<Chunk> {
    self.nested(Self::parse_chunk_inner)
  }

  fn parse_chunk_inner(&mut self) -> Result<Chunk> {
    let position = self.position();
    let mut clauses: Vec<CRef> = Vec::new();
    let destination = loop {
      let Some(cref) = self.parse_clause()? else {
        break self.parse_destination()?;
      };
      if let Some(inner) = clauses.last()
        && !inner.kind.may_nest_in(cref.kind)
      {
        return Err(ChunkError::parse(
          ParseErrorKind::BadChunkOrder,
          Some(cref.kind),
          cref.position,
        ));
      }
      let is_text = cref.kind.is_text();
      clauses.push(cref);
      if self.eat_connector() {
        continue;
      }
      if is_text {
        return Err(ChunkError::parse(
          ParseErrorKind::BadDestination,
          None,
          self.position(),
        ));
      }
      break Destination::Containers;
    };

    let mut chunk = Chunk::new(destination);
    chunk.position = position;
    for cref in clauses {
      chunk.push_outer(cref);
    }
    Ok(chunk)
  }

  /// One clause, or `None` with nothing consumed when the tokens ahead do
  /// not start a clause.
  fn parse_clause(&mut self) -> Result<Option<CRef>> {
    let mark = self.idx;
    let position = self.position();
    let doing_the = self.eat_word("the");

    if let Some(ordinal) = self.ordinal_at(0) {
      return match self.granularity_at(1) {
        Some(kind) if kind != Granularity::Url => {
          self.idx += 2;
          Ok(Some(CRef::new(kind, Address::Ordinal(ordinal), position)))
        },
        _ => {
          self.idx = mark;
          Ok(None)
        },
      };
    }

    if self.at_word("this") {
      return match self.granularity_at(1) {
        Some(kind) if !kind.is_text() && kind != Granularity::Url => {
          self.idx += 2;
          Ok(Some(CRef::new(kind, Address::This, position)))
        },
        _ => {
          self.idx = mark;
          Ok(None)
        },
      };
    }

    let kind = match self.granularity_at(0) {
      Some(kind) if !doing_the && kind != Granularity::Url => kind,
      _ => {
        self.idx = mark;
        return Ok(None);
      },
    };
    self.bump();

    let mut cref = CRef::new(kind, Address::This, position);
    if matches!(kind, Granularity::Card | Granularity::Background)
      && let Some(object @ Granularity::Object(_)) = self.granularity_at(0)
    {
      self.bump();
      cref.parent = Some(kind);
      cref.kind = object;
    }
    cref.address = self.parse_address(cref.kind)?;
    Ok(Some(cref))
  }

  fn parse_address(&mut self, kind: Granularity) -> Result<Address> {
    let position = self.position();
    let clause_error = |kind_of_error| ChunkError::parse(kind_of_error, Some(kind), position);

    if self.eat_word("id") {
      if kind.is_text() {
        return Err(clause_error(ParseErrorKind::BadExpression));
      }
      let expr = self
        .parse_clause_expr()
        .map_err(|_| clause_error(ParseErrorKind::BadExpression))?;
      return Ok(Address::Id(expr));
    }

    let start = match self.parse_clause_expr() {
      Ok(expr) => expr,
      Err(err @ ChunkError::RecursionLimit { .. }) => return Err(err),
      Err(_) if self.at_word("to") || self.at_word("thru") || self.at_word("through") => {
        return Err(clause_error(ParseErrorKind::BadRangeStart));
      },
      Err(_) => return Err(clause_error(ParseErrorKind::BadExpression)),
    };

    let range_position = self.position();
    if self.eat_range_word() {
      if !kind.is_text() {
        return Err(ChunkError::parse(
          ParseErrorKind::BadExpression,
          Some(kind),
          range_position,
        ));
      }
      let end_position = self.position();
      let end = self.parse_clause_expr().map_err(|_| {
        ChunkError::parse(ParseErrorKind::BadRangeEnd, Some(kind), end_position)
      })?;
      return Ok(Address::Range { start, end });
    }
    Ok(Address::Expression(start))
  }

  fn parse_destination(&mut self) -> Result<Destination> {
    let position = self.position();
    if self.peek().is_none_or(|token| is_reserved(token)) {
      return Err(ChunkError::parse(ParseErrorKind::BadDestination, None, position));
    }

    if self.eat_word("me") {
      return Ok(Destination::Me);
    }
    if self.at_word("the") {
      if self.peek_at(1).is_some_and(|token| token.is_word("target")) {
        self.idx += 2;
        return Ok(Destination::Target);
      }
      if self.peek_at(1).is_some_and(|token| token.is_word("owner"))
        && self.peek_at(2).is_some_and(|token| token.is_word("of"))
      {
        self.idx += 3;
        let chunk = self.parse_chunk()?;
        return Ok(Destination::OwnerOf(Box::new(chunk)));
      }
    }
    if self.eat_word("url") {
      let expr = self.nested(|p| p.parse_unary(Context::Value))?;
      return Ok(Destination::Url(expr));
    }
    if let Some(chunk) = self.try_parenthesized_chunk()? {
      return Ok(Destination::Nested(Box::new(chunk)));
    }

    match self.nested(|p| p.parse_unary(Context::Value))? {
      Expr::Variable(name) => Ok(Destination::Variable(name)),
      expr => Ok(Destination::Expression(expr)),
    }
  }

  /// `( chunk )` where the chunk has structure of its own. Anything else
  /// backs up to the opening parenthesis. A failed attempt is remembered so
  /// that nested parentheses are each tried once.
  fn try_parenthesized_chunk(&mut self) -> Result<Option<Chunk>> {
    let mark = self.idx;
    if self.no_chunk.get(mark).copied().unwrap_or(true) || !self.eat_kind(TokenKind::Open) {
      return Ok(None);
    }
    match self.parse_chunk() {
      Ok(chunk) if is_structural(&chunk) && self.eat_kind(TokenKind::Close) => Ok(Some(chunk)),
      Err(err @ ChunkError::RecursionLimit { .. }) => Err(err),
      _ => {
        self.no_chunk[mark] = true;
        self.idx = mark;
        Ok(None)
      },
    }
  }

  pub fn parse_expr(&mut self) -> Result<Expr> {
    self.parse_binary(Context::Value, 1)
  }

  fn parse_clause_expr(&mut self) -> Result<Expr> {
    self.parse_binary(Context::Clause, 1)
  }

  fn parse_binary(&mut self, ctx: Context, min: u8) -> Result<Expr> {
    let mut lhs = self.parse_unary(ctx)?;
    while let Some(op) = self.peek().and_then(|token| match token.kind {
      TokenKind::Operator | TokenKind::Word => BinaryOp::from_token(token.content),
      _ => None,
    }) {
      if op.precedence() < min {
        break;
      }
      self.bump();
      let rhs = self.nested(|p| p.parse_binary(ctx, op.precedence() + 1))?;
      lhs = Expr::binary(op, lhs, rhs);
    }
    Ok(lhs)
  }

  fn parse_unary(&mut self, ctx: Context) -> Result<Expr> {
    if self.peek().is_some_and(|token| token.is_operator("-")) {
      self.bump();
      return match self.nested(|p| p.parse_unary(ctx))? {
        Expr::Number(number) => Ok(Expr::Number(-number)),
        expr => Ok(Expr::Negate(Box::new(expr))),
      };
    }
    self.parse_primary(ctx)
  }

  fn parse_primary(&mut self, ctx: Context) -> Result<Expr> {
    let position = self.position();
    let bad = || ChunkError::parse(ParseErrorKind::BadExpression, None, position);
    let Some(token) = self.peek().cloned() else {
      return Err(bad());
    };

    match token.kind {
      TokenKind::Number => {
        self.bump();
        token.content.parse().map(Expr::Number).map_err(|_| bad())
      },
      TokenKind::Quoted => {
        self.bump();
        Ok(Expr::Text(token.content.parse::<StringValue>()?))
      },
      TokenKind::Open => {
        if let Some(chunk) = self.try_parenthesized_chunk()? {
          return Ok(Expr::Chunk(Box::new(chunk)));
        }
        self.bump();
        let expr = self.nested(Self::parse_expr)?;
        if !self.eat_kind(TokenKind::Close) {
          return Err(ChunkError::parse(
            ParseErrorKind::BadExpression,
            None,
            self.position(),
          ));
        }
        Ok(expr)
      },
      TokenKind::Word => self.parse_word(ctx, &token),
      _ => Err(bad()),
    }
  }

  fn parse_word(&mut self, ctx: Context, token: &Token<'a>) -> Result<Expr> {
    let position = token.span.start;
    let bad = || ChunkError::parse(ParseErrorKind::BadExpression, None, position);

    if token.is_word("the") {
      return self.parse_the(ctx);
    }
    if token.is_word("me") {
      self.bump();
      return Ok(Expr::Chunk(Box::new(Chunk::new(Destination::Me))));
    }
    if token.is_word("empty") {
      self.bump();
      return Ok(Expr::Text(StringValue::empty()));
    }
    if ctx == Context::Value && self.starts_chunk() {
      let chunk = self.parse_chunk()?;
      return Ok(Expr::Chunk(Box::new(chunk)));
    }
    if is_reserved(token) {
      return Err(bad());
    }

    self.bump();
    let name = Ident::from(token.content);
    if !self.eat_kind(TokenKind::Open) {
      return Ok(Expr::Variable(name));
    }
    let mut args = Vec::new();
    if !self.eat_kind(TokenKind::Close) {
      loop {
        args.push(self.nested(Self::parse_expr)?);
        if self.eat_kind(TokenKind::Comma) {
          continue;
        }
        if self.eat_kind(TokenKind::Close) {
          break;
        }
        return Err(ChunkError::parse(
          ParseErrorKind::BadExpression,
          None,
          self.position(),
        ));
      }
    }
    Ok(Expr::Function { name, args })
  }

  /// Whether the tokens ahead start a chunk rather than a plain word.
  fn starts_chunk(&self) -> bool {
    if self.at_word("url") || self.at_word("this") && self.granularity_at(1).is_some() {
      return true;
    }
    if self.ordinal_at(0).is_some() {
      return self.granularity_at(1).is_some();
    }
    self.granularity_at(0).is_some()
  }

  /// Everything that begins with `the`: `the target`, `the owner of`,
  /// ordinal chunks, `the number of <kinds>` and properties.
  fn parse_the(&mut self, ctx: Context) -> Result<Expr> {
    let position = self.position();
    let bad = || ChunkError::parse(ParseErrorKind::BadExpression, None, position);
    let next = self.peek_at(1).cloned().ok_or_else(bad)?;

    if next.is_word("target") {
      self.idx += 2;
      return Ok(Expr::Chunk(Box::new(Chunk::new(Destination::Target))));
    }
    if ctx == Context::Value {
      if next.is_word("owner") && self.peek_at(2).is_some_and(|token| token.is_word("of")) {
        self.idx += 3;
        let chunk = self.parse_chunk()?;
        return Ok(Expr::Chunk(Box::new(Chunk::new(Destination::OwnerOf(Box::new(chunk))))));
      }
      if self.ordinal_at(1).is_some() {
        let chunk = self.parse_chunk()?;
        return Ok(Expr::Chunk(Box::new(chunk)));
      }
      if let Some(count) = self.try_count()? {
        return Ok(count);
      }
    }

    if next.kind != TokenKind::Word || is_reserved(&next) {
      return Err(bad());
    }
    self.idx += 2;
    let name = Ident::from(next.content);
    let of = if ctx == Context::Value && self.eat_word("of") {
      Some(Box::new(self.parse_chunk()?))
    } else {
      None
    };
    Ok(Expr::Property { name, of })
  }

  /// `the number of <kinds> [of <chunk>]`.
  fn try_count(&mut self) -> Result<Option<Expr>> {
    let plural = |token: Option<&Token<'_>>| {
      token
        .filter(|token| token.kind == TokenKind::Word)
        .and_then(|token| Granularity::from_keyword(token.content))
        .and_then(|(kind, plural)| plural.then_some(kind))
    };
    let is_count = self.peek_at(1).is_some_and(|token| token.is_word("number"))
      && self.peek_at(2).is_some_and(|token| token.is_word("of"));
    let Some(kind) = plural(self.peek_at(3)).filter(|_| is_count) else {
      return Ok(None);
    };
    self.idx += 4;
    let of = if self.eat_connector() {
      Some(Box::new(self.parse_chunk()?))
    } else {
      None
    };
    Ok(Some(Expr::Count { kind, of }))
  }
}

fn is_reserved(token: &Token<'_>) -> bool {
  token.kind == TokenKind::Word && RESERVED.iter().any(|&word| token.is_word(word))
}

fn is_structural(chunk: &Chunk) -> bool {
  chunk.is_text_chunk()
    || chunk.has_containers()
    || !matches!(
      chunk.destination,
      Destination::Variable(_) | Destination::Expression(_)
    )
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::granularity::ObjectKind;

  fn text(s: &str) -> Expr {
    Expr::Text(s.parse().unwrap())
  }

  fn kinds(chunk: &Chunk) -> Vec<Granularity> {
    chunk.text.iter().map(|cref| cref.kind).collect()
  }

  #[test]
  fn item_range_of_literal() {
    let chunk = parse("item 2 to 3 of \"a,b,c,d\"").unwrap();
    assert_eq!(chunk.destination, Destination::Expression(text("a,b,c,d")));
    let item = chunk.text.get(Granularity::Item).unwrap();
    assert_eq!(item.address, Address::Range {
      start: Expr::Number(2.0),
      end:   Expr::Number(3.0),
    });
    assert_eq!(item.position, 0);
  }

  #[test]
  fn negative_expression_and_variable() {
    let chunk = parse("word -1 of it").unwrap();
    assert_eq!(chunk.destination, Destination::Variable("it".into()));
    assert_eq!(
      chunk.text.get(Granularity::Word).unwrap().address,
      Address::Expression(Expr::Number(-1.0))
    );
  }

  #[test]
  fn clauses_nest_inner_first() {
    let chunk = parse("the first char of word 2 of line x + 1 of field \"notes\" of card 3").unwrap();
    assert_eq!(kinds(&chunk), [Granularity::Line, Granularity::Word, Granularity::Character]);
    assert_eq!(
      chunk.text.get(Granularity::Character).unwrap().address,
      Address::Ordinal(Ordinal::Nth(0))
    );
    assert_eq!(
      chunk.text.get(Granularity::Line).unwrap().address,
      Address::Expression(Expr::binary(
        BinaryOp::Add,
        Expr::Variable("x".into()),
        Expr::Number(1.0)
      ))
    );
    assert_eq!(chunk.objects.len(), 1);
    assert_eq!(chunk.objects[0].kind, Granularity::Object(ObjectKind::Field));
    assert!(chunk.card.is_some());
    assert_eq!(chunk.destination, Destination::Containers);
  }

  #[test]
  fn out_of_order_clauses_are_rejected() {
    assert_eq!(
      parse("line 1 of word 2 of x"),
      Err(ChunkError::parse(ParseErrorKind::BadChunkOrder, Some(Granularity::Word), 10))
    );
    assert_eq!(
      parse("word 1 of word 2 of x"),
      Err(ChunkError::parse(ParseErrorKind::BadChunkOrder, Some(Granularity::Word), 10))
    );
  }

  #[test]
  fn containers_may_repeat() {
    let chunk = parse("button 1 of group \"inner\" of group \"outer\" of this card").unwrap();
    assert_eq!(chunk.groups.len(), 2);
    assert_eq!(chunk.groups[0].address, Address::Expression(text("outer")));
    assert_eq!(chunk.card.as_ref().unwrap().address, Address::This);
  }

  #[test]
  fn parent_types_and_ids() {
    let chunk = parse("bg field id 12").unwrap();
    let field = &chunk.objects[0];
    assert_eq!(field.kind, Granularity::Object(ObjectKind::Field));
    assert_eq!(field.parent, Some(Granularity::Background));
    assert_eq!(field.address, Address::Id(Expr::Number(12.0)));
  }

  #[test]
  fn clause_errors_name_the_clause() {
    assert_eq!(
      parse("item to 3 of x"),
      Err(ChunkError::parse(ParseErrorKind::BadRangeStart, Some(Granularity::Item), 5))
    );
    assert_eq!(
      parse("item 1 to of x"),
      Err(ChunkError::parse(ParseErrorKind::BadRangeEnd, Some(Granularity::Item), 10))
    );
    assert_eq!(
      parse("line id 3 of x"),
      Err(ChunkError::parse(ParseErrorKind::BadExpression, Some(Granularity::Line), 5))
    );
    assert_eq!(
      parse("word 2"),
      Err(ChunkError::parse(ParseErrorKind::BadDestination, None, 6))
    );
    assert_eq!(
      parse("word 2 of"),
      Err(ChunkError::parse(ParseErrorKind::BadDestination, None, 9))
    );
  }

  #[test]
  fn special_destinations() {
    assert_eq!(parse("line 1 of me").unwrap().destination, Destination::Me);
    assert_eq!(parse("the target").unwrap().destination, Destination::Target);
    let chunk = parse("the owner of field 2").unwrap();
    let Destination::OwnerOf(inner) = chunk.destination else {
      panic!("expected an owner");
    };
    assert_eq!(inner.objects.len(), 1);
    let chunk = parse("line 2 of url (\"file:\" & name)").unwrap();
    assert!(matches!(chunk.destination, Destination::Url(Expr::Binary { .. })));
  }

  #[test]
  fn parenthesized_chunks_nest() {
    let chunk = parse("char 1 of (word 2 of x)").unwrap();
    let Destination::Nested(inner) = &chunk.destination else {
      panic!("expected a nested chunk");
    };
    assert_eq!(kinds(inner), [Granularity::Word]);
    assert_eq!(kinds(&chunk), [Granularity::Character]);

    let chunk = parse("char 1 of (x)").unwrap();
    assert_eq!(chunk.destination, Destination::Variable("x".into()));
  }

  #[test]
  fn destinations_are_single_factors() {
    assert!(parse("item 1 of x & y").is_err());
    let expr = parse_expression("item 1 of x & y").unwrap();
    let Expr::Binary { op, lhs, .. } = expr else {
      panic!("expected a concatenation");
    };
    assert_eq!(op, BinaryOp::Concat);
    assert!(matches!(*lhs, Expr::Chunk(_)));
  }

  #[test]
  fn expressions() {
    assert_eq!(
      parse_expression("2 + 3 * -x").unwrap(),
      Expr::binary(
        BinaryOp::Add,
        Expr::Number(2.0),
        Expr::binary(
          BinaryOp::Multiply,
          Expr::Number(3.0),
          Expr::Negate(Box::new(Expr::Variable("x".into())))
        )
      )
    );
    assert_eq!(
      parse_expression("max(1, y) mod 2").unwrap(),
      Expr::binary(
        BinaryOp::Modulo,
        Expr::Function {
          name: "max".into(),
          args: vec![Expr::Number(1.0), Expr::Variable("y".into())],
        },
        Expr::Number(2.0)
      )
    );
    assert_eq!(
      parse_expression("the text of field 1").unwrap(),
      Expr::Property {
        name: "text".into(),
        of:   Some(Box::new(parse("field 1").unwrap())),
      }
    );
    assert!(matches!(
      parse_expression("the number of words of x").unwrap(),
      Expr::Count {
        kind: Granularity::Word,
        of:   Some(_),
      }
    ));
  }

  #[test]
  fn deep_parentheses_parse_once() {
    let wrap = |inner: &str| format!("{}{inner}{}", "(".repeat(40), ")".repeat(40));
    assert_eq!(parse_expression(&wrap("1")), Ok(Expr::Number(1.0)));
    let sum = parse_expression(&format!("{} * 3", wrap("1 + 2"))).unwrap();
    assert_eq!(
      sum,
      Expr::binary(
        BinaryOp::Multiply,
        Expr::binary(BinaryOp::Add, Expr::Number(1.0), Expr::Number(2.0)),
        Expr::Number(3.0),
      )
    );
    let chunk = parse(&format!("char 1 of {}", wrap("word 2 of x"))).unwrap();
    assert!(matches!(chunk.destination, Destination::Nested(_)));
  }

  #[test]
  fn unbalanced_input() {
    assert_eq!(
      parse_expression("(1 + 2"),
      Err(ChunkError::parse(ParseErrorKind::BadExpression, None, 6))
    );
    assert_eq!(
      parse("word 1 of x y"),
      Err(ChunkError::parse(ParseErrorKind::BadExpression, None, 12))
    );
    let deep = format!("{}1{}", "(".repeat(MAX_NESTING + 1), ")".repeat(MAX_NESTING + 1));
    assert_eq!(
      parse_expression(&deep),
      Err(ChunkError::RecursionLimit { limit: MAX_NESTING })
    );
  }
}
