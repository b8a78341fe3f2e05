//! Tokens of the chunk expression language.
//!
//! The same tokenizer splits text for `token` clauses, so it never fails on
//! input it does not understand: unknown punctuation becomes a single
//! [`TokenKind::Other`] token. Only unterminated string literals are errors,
//! and only when the tokenizer validates.

use std::ops::Range;

use the_core::chars::{
  CharCategory,
  categorize_char,
  char_is_ident_continue,
  char_is_word,
};

use crate::error::{
  ChunkError,
  ParseErrorKind,
  Result,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
  /// An identifier or keyword.
  Word,
  Number,
  /// A double quoted literal. The content excludes the quotes.
  Quoted,
  /// `+ - * / & && = < > <= >= <> ^`
  Operator,
  Open,
  Close,
  Comma,
  /// Any other single character.
  Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
  pub kind:          TokenKind,
  /// Bytes of the input the token spans, quotes included.
  pub span:          Range<usize>,
  pub content:       &'a str,
  pub is_terminated: bool,
}

impl Token<'_> {
  /// Whether this is the word `keyword`, ignoring case.
  pub fn is_word(&self, keyword: &str) -> bool {
    self.kind == TokenKind::Word && self.content.eq_ignore_ascii_case(keyword)
  }

  pub fn is_operator(&self, op: &str) -> bool {
    self.kind == TokenKind::Operator && self.content == op
  }
}

pub struct Tokenizer<'a> {
  input:    &'a str,
  /// Whether an unterminated literal is reported as an error. When this is
  /// `false` the iterator never returns `Err`.
  validate: bool,
  /// The current byte index of the input being considered.
  pos:      usize,
}

impl<'a> Tokenizer<'a> {
  pub fn new(input: &'a str, validate: bool) -> Self {
    Self {
      input,
      validate,
      pos: 0,
    }
  }

  /// Returns the current byte index position of the tokenizer in the input.
  pub fn pos(&self) -> usize {
    self.pos
  }

  fn ch(&self) -> Option<char> {
    self.input[self.pos..].chars().next()
  }

  fn peek_ch(&self) -> Option<char> {
    let mut chars = self.input[self.pos..].chars();
    chars.next();
    chars.next()
  }

  fn bump(&mut self) {
    if let Some(ch) = self.ch() {
      self.pos += ch.len_utf8();
    }
  }

  fn skip_blanks(&mut self) {
    loop {
      match self.ch() {
        Some(ch) if matches!(categorize_char(ch), CharCategory::Whitespace | CharCategory::Eol) => {
          self.bump();
        },
        Some('-') if self.peek_ch() == Some('-') => self.skip_comment(),
        Some('#') => self.skip_comment(),
        _ => return,
      }
    }
  }

  fn skip_comment(&mut self) {
    while let Some(ch) = self.ch() {
      if categorize_char(ch) == CharCategory::Eol {
        return;
      }
      self.bump();
    }
  }

  fn eat_while(&mut self, f: impl Fn(char) -> bool) {
    while self.ch().is_some_and(&f) {
      self.bump();
    }
  }

  fn parse_number(&mut self) {
    self.eat_while(|ch| ch.is_ascii_digit());
    if self.ch() == Some('.') && self.peek_ch().is_some_and(|ch| ch.is_ascii_digit()) {
      self.bump();
      self.eat_while(|ch| ch.is_ascii_digit());
    }
    if matches!(self.ch(), Some('e' | 'E')) {
      let rest = &self.input[self.pos + 1..];
      let digits = rest.strip_prefix(['+', '-']).unwrap_or(rest);
      if digits.starts_with(|ch: char| ch.is_ascii_digit()) {
        self.pos += 1 + (rest.len() - digits.len());
        self.eat_while(|ch| ch.is_ascii_digit());
      }
    }
  }

  /// Consumes a literal that opened at `self.pos`. Literals end at the
  /// closing quote or, unterminated, at the end of the line.
  fn parse_quoted(&mut self) -> (&'a str, bool) {
    self.bump();
    let start = self.pos;
    while let Some(ch) = self.ch() {
      if ch == '"' {
        let content = &self.input[start..self.pos];
        self.bump();
        return (content, true);
      }
      if categorize_char(ch) == CharCategory::Eol {
        break;
      }
      self.bump();
    }
    (&self.input[start..self.pos], false)
  }

  fn parse_operator(&mut self, first: char) -> TokenKind {
    self.bump();
    let second = self.ch();
    match (first, second) {
      ('&', Some('&')) | ('<', Some('=' | '>')) | ('>', Some('=')) => {
        self.bump();
        TokenKind::Operator
      },
      ('+' | '-' | '*' | '/' | '&' | '=' | '<' | '>' | '^', _) => TokenKind::Operator,
      ('(', _) => TokenKind::Open,
      (')', _) => TokenKind::Close,
      (',', _) => TokenKind::Comma,
      _ => TokenKind::Other,
    }
  }
}

impl<'a> Iterator for Tokenizer<'a> {
  type Item = Result<Token<'a>>;

  fn next(&mut self) -> Option<Self::Item> {
    self.skip_blanks();

    let ch = self.ch()?;
    let start = self.pos;
    let (kind, content, is_terminated) = match ch {
      '"' => {
        let (content, is_terminated) = self.parse_quoted();
        if self.validate && !is_terminated {
          return Some(Err(ChunkError::parse(ParseErrorKind::BadExpression, None, start)));
        }
        (TokenKind::Quoted, content, is_terminated)
      },
      '0'..='9' => {
        self.parse_number();
        (TokenKind::Number, &self.input[start..self.pos], true)
      },
      '.' if self.peek_ch().is_some_and(|ch| ch.is_ascii_digit()) => {
        self.parse_number();
        (TokenKind::Number, &self.input[start..self.pos], true)
      },
      ch if char_is_word(ch) => {
        self.eat_while(char_is_ident_continue);
        (TokenKind::Word, &self.input[start..self.pos], true)
      },
      ch => {
        let kind = self.parse_operator(ch);
        (kind, &self.input[start..self.pos], true)
      },
    };

    Some(Ok(Token {
      kind,
      span: start..self.pos,
      content,
      is_terminated,
    }))
  }
}

pub fn tokenize(input: &str, validate: bool) -> Result<Vec<Token<'_>>> {
  Tokenizer::new(input, validate).collect()
}

/// Byte spans of the tokens of `input`, for splitting text into tokens.
pub fn token_spans(input: &str) -> Vec<Range<usize>> {
  Tokenizer::new(input, false)
    .map_while(|token| token.ok())
    .map(|token| token.span)
    .collect()
}
