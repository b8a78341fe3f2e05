//! printf style formatting into strings.
//!
//! The scalar conversions follow C: `d i u x X o c s f F e E g G` and `%%`,
//! with the `- + space # 0` flags, a width and a precision, either of which
//! may be `*` to take it from the arguments. Length modifiers are accepted
//! and ignored. Two extensions take string values: `%@` appends the next
//! argument, and `%*@` takes a code unit range first and appends only that
//! part of the value.

use std::{
  fmt::Write,
  ops::Range,
};

use crate::{
  error::{
    Result,
    StringError,
  },
  value::{
    MutableString,
    StringData,
    StringValue,
  },
};

#[derive(Debug, Clone)]
pub enum FormatArg<'a> {
  Int(i64),
  Uint(u64),
  Float(f64),
  Char(char),
  Str(&'a str),
  Value(&'a StringData),
  /// A number for `%@`: written as an integer when it has no fraction.
  Number(f64),
  Range(Range<usize>),
}

bitflags::bitflags! {
  #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
  struct FormatFlags: u8 {
    const LEFT      = 1 << 0;
    const PLUS      = 1 << 1;
    const SPACE     = 1 << 2;
    const ALTERNATE = 1 << 3;
    const ZERO      = 1 << 4;
  }
}

#[derive(Debug, Default)]
struct Directive {
  flags:     FormatFlags,
  width:     Option<usize>,
  precision: Option<usize>,
}

const DEFAULT_PRECISION: usize = 6;

/// Formats `args` into a new immutable string.
pub fn format(fmt: &str, args: &[FormatArg<'_>]) -> Result<StringValue> {
  let mut out = MutableString::new();
  out.append_format(fmt, args)?;
  Ok(out.into_value())
}

struct Args<'s, 'a> {
  args: std::slice::Iter<'s, FormatArg<'a>>,
}

impl<'s, 'a> Args<'s, 'a> {
  fn next(&mut self, position: usize) -> Result<&'s FormatArg<'a>> {
    self.args.next().ok_or(StringError::BadFormat { position })
  }

  fn int(&mut self, position: usize) -> Result<i64> {
    match self.next(position)? {
      FormatArg::Int(value) => Ok(*value),
      FormatArg::Uint(value) => Ok(*value as i64),
      FormatArg::Char(ch) => Ok(*ch as i64),
      _ => Err(StringError::BadFormat { position }),
    }
  }

  fn uint(&mut self, position: usize) -> Result<u64> {
    match self.next(position)? {
      FormatArg::Uint(value) => Ok(*value),
      FormatArg::Int(value) => Ok(*value as u64),
      _ => Err(StringError::BadFormat { position }),
    }
  }

  fn float(&mut self, position: usize) -> Result<f64> {
    match self.next(position)? {
      FormatArg::Float(value) | FormatArg::Number(value) => Ok(*value),
      FormatArg::Int(value) => Ok(*value as f64),
      FormatArg::Uint(value) => Ok(*value as f64),
      _ => Err(StringError::BadFormat { position }),
    }
  }
}

impl MutableString {
  /// Appends formatted text. On error nothing is appended.
  pub fn append_format(&mut self, fmt: &str, args: &[FormatArg<'_>]) -> Result<()> {
    let mut out = MutableString::new();
    let mut pending = String::new();
    let mut args = Args { args: args.iter() };
    let mut chars = fmt.char_indices().peekable();

    while let Some((position, ch)) = chars.next() {
      if ch != '%' {
        pending.push(ch);
        continue;
      }
      let bad = StringError::BadFormat { position };

      let mut directive = Directive::default();
      while let Some(&(_, flag)) = chars.peek() {
        let flag = match flag {
          '-' => FormatFlags::LEFT,
          '+' => FormatFlags::PLUS,
          ' ' => FormatFlags::SPACE,
          '#' => FormatFlags::ALTERNATE,
          '0' => FormatFlags::ZERO,
          _ => break,
        };
        directive.flags |= flag;
        chars.next();
      }

      let mut star_width = false;
      if chars.next_if(|&(_, c)| c == '*').is_some() {
        star_width = true;
      } else {
        directive.width = digits(&mut chars);
      }
      if chars.next_if(|&(_, c)| c == '.').is_some() {
        directive.precision = if chars.next_if(|&(_, c)| c == '*').is_some() {
          usize::try_from(args.int(position)?).ok()
        } else {
          Some(digits(&mut chars).unwrap_or(0))
        };
      }
      while chars.next_if(|&(_, c)| matches!(c, 'h' | 'l' | 'q' | 'L' | 'j' | 'z' | 't')).is_some() {}

      let Some((_, conversion)) = chars.next() else {
        return Err(bad);
      };

      if conversion == '@' {
        if !directive.flags.is_empty() || directive.width.is_some() || directive.precision.is_some() {
          return Err(bad);
        }
        let range = if star_width {
          match args.next(position)? {
            FormatArg::Range(range) => Some(range.clone()),
            _ => return Err(bad),
          }
        } else {
          None
        };
        let arg = args.next(position)?;
        out.append_str(&pending)?;
        pending.clear();
        match (arg, range) {
          (FormatArg::Value(value), None) => out.append(value)?,
          (FormatArg::Value(value), Some(range)) => {
            let part = value.substring(range)?;
            out.append(&part)?;
          },
          (FormatArg::Str(text), range) => {
            let value: StringValue = text.parse()?;
            let part = value.substring(range.unwrap_or(0..value.len()))?;
            out.append(&part)?;
          },
          (FormatArg::Number(number), None) => write_number(&mut pending, *number),
          _ => return Err(bad),
        }
        continue;
      }

      if star_width {
        let width = args.int(position)?;
        if width < 0 {
          directive.flags |= FormatFlags::LEFT;
        }
        directive.width = Some(width.unsigned_abs() as usize);
      }

      match conversion {
        '%' => pending.push('%'),
        'd' | 'i' => {
          let value = args.int(position)?;
          let sign = sign_of(value < 0, directive.flags);
          let body = integer_digits(value.unsigned_abs().to_string(), directive.precision);
          pad_number(&mut pending, &directive, sign, &body, directive.precision.is_none());
        },
        'u' | 'x' | 'X' | 'o' => {
          let value = args.uint(position)?;
          let (text, prefix) = match conversion {
            'u' => (value.to_string(), ""),
            'x' => (format!("{value:x}"), "0x"),
            'X' => (format!("{value:X}"), "0X"),
            _ => (format!("{value:o}"), "0"),
          };
          let mut body = integer_digits(text, directive.precision);
          let prefix = match conversion {
            'o' if directive.flags.contains(FormatFlags::ALTERNATE) && !body.starts_with('0') => prefix,
            'x' | 'X' if directive.flags.contains(FormatFlags::ALTERNATE) && value != 0 => prefix,
            _ => "",
          };
          if conversion == 'o' && !prefix.is_empty() {
            body.insert(0, '0');
            pad_number(&mut pending, &directive, "", &body, directive.precision.is_none());
          } else {
            pad_number(&mut pending, &directive, prefix, &body, directive.precision.is_none());
          }
        },
        'c' => {
          let ch = match args.next(position)? {
            FormatArg::Char(ch) => *ch,
            FormatArg::Int(value) => u32::try_from(*value)
              .ok()
              .and_then(char::from_u32)
              .ok_or(StringError::BadFormat { position })?,
            _ => return Err(bad),
          };
          pad_text(&mut pending, &directive, &ch.to_string());
        },
        's' => {
          let text = match args.next(position)? {
            FormatArg::Str(text) => (*text).to_string(),
            FormatArg::Value(value) => value.to_string(),
            _ => return Err(bad),
          };
          let text = match directive.precision {
            Some(precision) => text.chars().take(precision).collect(),
            None => text,
          };
          pad_text(&mut pending, &directive, &text);
        },
        'f' | 'F' | 'e' | 'E' | 'g' | 'G' => {
          let value = args.float(position)?;
          let sign = sign_of(value.is_sign_negative() && !value.is_nan(), directive.flags);
          let upper = conversion.is_ascii_uppercase();
          let body = if !value.is_finite() {
            let word = if value.is_nan() { "nan" } else { "inf" };
            if upper { word.to_ascii_uppercase() } else { word.to_string() }
          } else {
            let precision = directive.precision.unwrap_or(DEFAULT_PRECISION);
            let alternate = directive.flags.contains(FormatFlags::ALTERNATE);
            match conversion.to_ascii_lowercase() {
              'f' => fixed(value.abs(), precision, alternate),
              'e' => exponent(value.abs(), precision, upper, alternate),
              _ => general(value.abs(), precision, upper, alternate),
            }
          };
          pad_number(&mut pending, &directive, sign, &body, value.is_finite());
        },
        _ => return Err(bad),
      }
    }

    out.append_str(&pending)?;
    self.append(&out)
  }
}

fn digits(chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>) -> Option<usize> {
  let mut value: Option<usize> = None;
  while let Some((_, ch)) = chars.next_if(|(_, c)| c.is_ascii_digit()) {
    let digit = ch as usize - '0' as usize;
    value = Some(value.unwrap_or(0).saturating_mul(10).saturating_add(digit));
  }
  value
}

fn write_number(out: &mut String, number: f64) {
  if number.is_finite() && number.fract() == 0.0 && number.abs() < i64::MAX as f64 {
    let _ = write!(out, "{}", number as i64);
  } else {
    out.push_str(&fixed(number, DEFAULT_PRECISION, false));
  }
}

fn sign_of(negative: bool, flags: FormatFlags) -> &'static str {
  if negative {
    "-"
  } else if flags.contains(FormatFlags::PLUS) {
    "+"
  } else if flags.contains(FormatFlags::SPACE) {
    " "
  } else {
    ""
  }
}

/// Left pads integer digits with zeros up to `precision`. A zero precision
/// prints zero as nothing.
fn integer_digits(text: String, precision: Option<usize>) -> String {
  match precision {
    Some(0) if text == "0" => String::new(),
    Some(precision) if text.len() < precision => {
      let mut padded = "0".repeat(precision - text.len());
      padded.push_str(&text);
      padded
    },
    _ => text,
  }
}

fn pad_number(out: &mut String, directive: &Directive, prefix: &str, body: &str, zero_allowed: bool) {
  let len = prefix.chars().count() + body.chars().count();
  let fill = directive.width.unwrap_or(0).saturating_sub(len);
  let left = directive.flags.contains(FormatFlags::LEFT);
  if !left && directive.flags.contains(FormatFlags::ZERO) && zero_allowed {
    out.push_str(prefix);
    out.extend(std::iter::repeat_n('0', fill));
    out.push_str(body);
    return;
  }
  if !left {
    out.extend(std::iter::repeat_n(' ', fill));
  }
  out.push_str(prefix);
  out.push_str(body);
  if left {
    out.extend(std::iter::repeat_n(' ', fill));
  }
}

fn pad_text(out: &mut String, directive: &Directive, text: &str) {
  let fill = directive.width.unwrap_or(0).saturating_sub(text.chars().count());
  let left = directive.flags.contains(FormatFlags::LEFT);
  if !left {
    out.extend(std::iter::repeat_n(' ', fill));
  }
  out.push_str(text);
  if left {
    out.extend(std::iter::repeat_n(' ', fill));
  }
}

fn fixed(value: f64, precision: usize, alternate: bool) -> String {
  let mut text = format!("{value:.precision$}");
  if alternate && precision == 0 {
    text.push('.');
  }
  text
}

/// Splits `value` into a mantissa rounded to `precision` decimals and its
/// decimal exponent.
fn scientific(value: f64, precision: usize) -> (String, i32) {
  let text = format!("{value:.precision$e}");
  match text.split_once('e') {
    Some((mantissa, exponent)) => (mantissa.to_string(), exponent.parse().unwrap_or(0)),
    None => (text, 0),
  }
}

fn exponent(value: f64, precision: usize, upper: bool, alternate: bool) -> String {
  let (mut mantissa, exp) = scientific(value, precision);
  if alternate && precision == 0 {
    mantissa.push('.');
  }
  let sign = if exp < 0 { '-' } else { '+' };
  let e = if upper { 'E' } else { 'e' };
  format!("{mantissa}{e}{sign}{:02}", exp.unsigned_abs())
}

fn general(value: f64, precision: usize, upper: bool, alternate: bool) -> String {
  let precision = precision.max(1);
  let (_, exp) = scientific(value, precision - 1);
  let mut text = if exp < -4 || exp >= precision as i32 {
    exponent(value, precision - 1, upper, alternate)
  } else {
    fixed(value, (precision as i32 - 1 - exp) as usize, alternate)
  };
  if !alternate {
    let (number, suffix) = match text.find(['e', 'E']) {
      Some(at) => text.split_at(at),
      None => (text.as_str(), ""),
    };
    if number.contains('.') {
      let trimmed = number.trim_end_matches('0').trim_end_matches('.');
      text = format!("{trimmed}{suffix}");
    }
  }
  text
}
