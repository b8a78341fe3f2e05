use std::fmt;

use the_string::StringValue;

use crate::resolve::ObjectHandle;

/// A value produced while evaluating a chunk expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
  Text(StringValue),
  Number(f64),
  /// The result of a `byte` chunk.
  Data(Vec<u8>),
  Object(ObjectHandle),
}

impl Value {
  pub fn empty() -> Self {
    Value::Text(StringValue::empty())
  }

  pub fn text(text: &str) -> Self {
    Value::Text(text.parse().unwrap_or_default())
  }

  pub fn as_text(&self) -> Option<&StringValue> {
    match self {
      Value::Text(text) => Some(text),
      _ => None,
    }
  }
}

impl Default for Value {
  fn default() -> Self {
    Value::empty()
  }
}

impl From<StringValue> for Value {
  fn from(text: StringValue) -> Self {
    Value::Text(text)
  }
}

impl From<f64> for Value {
  fn from(number: f64) -> Self {
    Value::Number(number)
  }
}

impl fmt::Display for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Value::Text(text) => write!(f, "{text}"),
      Value::Number(number) => f.write_str(&format_number(*number)),
      Value::Data(bytes) => write!(f, "{}", String::from_utf8_lossy(bytes)),
      Value::Object(handle) => write!(f, "object {}", handle.0),
    }
  }
}

/// Integral values print without a fraction, others with at most six
/// decimals and no trailing zeros.
pub fn format_number(number: f64) -> String {
  if number.fract() == 0.0 && number.abs() < 1e15 {
    return format!("{}", number as i64);
  }
  let text = format!("{number:.6}");
  let text = text.trim_end_matches('0').trim_end_matches('.');
  match text {
    "-0" => "0".to_string(),
    text => text.to_string(),
  }
}
