//! Construction from and conversion to external representations.

use std::{
  ffi::CStr,
  str::FromStr,
};

use the_core::{
  grapheme,
  native::{
    self,
    Codepage,
    NATIVE_CODEPAGE,
    char_to_native,
    unit_to_native,
  },
  unicode::{
    self,
    NormalForm,
  },
};

use crate::{
  buffer::Buffer,
  error::{
    Result,
    StringError,
  },
  value::{
    Flags,
    StringData,
    StringValue,
    Text,
    Units,
  },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextEncoding {
  Ascii,
  Native,
  Utf8,
  /// UTF-16 with an optional byte order mark, little endian without one.
  Utf16,
  Utf16Le,
  Utf16Be,
  /// UTF-32 with an optional byte order mark, little endian without one.
  Utf32,
  Utf32Le,
  Utf32Be,
  Windows1252,
  MacRoman,
  IsoLatin1,
}

impl StringValue {
  pub fn from_native_chars(chars: &[u8]) -> Result<Self> {
    if chars.is_empty() {
      return Ok(Self::empty());
    }
    Ok(Self::from_data(StringData::native(Buffer::from_slice(chars)?)))
  }

  /// UTF-16 content, kept in UTF-16 even when it could be native.
  pub fn from_chars(chars: &[u16]) -> Result<Self> {
    if chars.is_empty() {
      return Ok(Self::empty());
    }
    Ok(Self::from_data(StringData::unicode(
      Buffer::from_slice(chars)?,
      Flags::UNCHECKED,
    )))
  }

  /// UTF-16 content, stored natively when every unit allows it.
  pub fn from_chars_compact(chars: &[u16]) -> Result<Self> {
    let native: Option<Vec<u8>> = chars.iter().map(|&unit| unit_to_native(unit)).collect();
    match native {
      Some(bytes) => Self::from_native_chars(&bytes),
      None => Self::from_chars(chars),
    }
  }

  /// The bytes of `string` up to its terminator, in the native encoding.
  pub fn from_c_string(string: &CStr) -> Result<Self> {
    Self::from_native_chars(string.to_bytes())
  }

  /// Wide characters up to the first NUL, or all of them.
  pub fn from_wstring(chars: &[u16]) -> Result<Self> {
    let end = chars.iter().position(|&unit| unit == 0).unwrap_or(chars.len());
    Self::from_chars_compact(&chars[..end])
  }

  pub fn from_bytes(bytes: &[u8], encoding: TextEncoding) -> Result<Self> {
    match encoding {
      TextEncoding::Ascii => {
        let ascii: Vec<u8> = bytes
          .iter()
          .map(|&b| if b.is_ascii() { b } else { b'?' })
          .collect();
        Self::from_native_chars(&ascii)
      },
      TextEncoding::Native => Self::from_native_chars(bytes),
      TextEncoding::Utf8 => {
        let (text, _) = encoding_rs::UTF_8.decode_without_bom_handling(bytes);
        text.parse()
      },
      TextEncoding::Utf16 => match bytes {
        [0xFE, 0xFF, rest @ ..] => Self::from_bytes(rest, TextEncoding::Utf16Be),
        [0xFF, 0xFE, rest @ ..] => Self::from_bytes(rest, TextEncoding::Utf16Le),
        _ => Self::from_bytes(bytes, TextEncoding::Utf16Le),
      },
      TextEncoding::Utf16Le | TextEncoding::Utf16Be => {
        let decode = if encoding == TextEncoding::Utf16Le {
          u16::from_le_bytes
        } else {
          u16::from_be_bytes
        };
        let units: Vec<u16> = bytes.chunks_exact(2).map(|pair| decode([pair[0], pair[1]])).collect();
        Self::from_chars_compact(&units)
      },
      TextEncoding::Utf32 => match bytes {
        [0x00, 0x00, 0xFE, 0xFF, rest @ ..] => Self::from_bytes(rest, TextEncoding::Utf32Be),
        [0xFF, 0xFE, 0x00, 0x00, rest @ ..] => Self::from_bytes(rest, TextEncoding::Utf32Le),
        _ => Self::from_bytes(bytes, TextEncoding::Utf32Le),
      },
      TextEncoding::Utf32Le | TextEncoding::Utf32Be => {
        let decode = if encoding == TextEncoding::Utf32Le {
          u32::from_le_bytes
        } else {
          u32::from_be_bytes
        };
        let text: String = bytes
          .chunks_exact(4)
          .map(|quad| {
            char::from_u32(decode([quad[0], quad[1], quad[2], quad[3]]))
              .unwrap_or(char::REPLACEMENT_CHARACTER)
          })
          .collect();
        text.parse()
      },
      TextEncoding::Windows1252 => Self::from_codepage(bytes, Codepage::Windows1252),
      TextEncoding::MacRoman => Self::from_codepage(bytes, Codepage::MacRoman),
      TextEncoding::IsoLatin1 => Self::from_codepage(bytes, Codepage::Latin1),
    }
  }

  fn from_codepage(bytes: &[u8], codepage: Codepage) -> Result<Self> {
    if codepage == NATIVE_CODEPAGE {
      return Self::from_native_chars(bytes);
    }
    let decoder = match codepage {
      Codepage::Windows1252 => Some(encoding_rs::WINDOWS_1252),
      Codepage::MacRoman => Some(encoding_rs::MACINTOSH),
      // The WHATWG tables treat Latin-1 labels as Windows-1252.
      Codepage::Latin1 => None,
    };
    match decoder {
      Some(decoder) => decoder.decode_without_bom_handling(bytes).0.parse(),
      None => {
        let units: Vec<u16> = bytes.iter().map(|&b| b as u16).collect();
        Self::from_chars_compact(&units)
      },
    }
  }
}

impl FromStr for StringValue {
  type Err = StringError;

  /// Stores `text` natively when every character allows it.
  fn from_str(text: &str) -> Result<Self> {
    let native: Option<Vec<u8>> = text.chars().map(char_to_native).collect();
    match native {
      Some(bytes) => Self::from_native_chars(&bytes),
      None => {
        let units: Vec<u16> = text.encode_utf16().collect();
        Self::from_chars(&units)
      },
    }
  }
}

impl StringData {
  /// The content in the native encoding. Each grapheme without a native
  /// equivalent, even after composition, becomes a single `?`.
  pub fn to_native_chars(&self) -> Vec<u8> {
    match &self.units {
      Units::Native(buffer) => buffer.as_slice().to_vec(),
      Units::Unicode(buffer) => native_lossy(buffer.as_slice()),
    }
  }

  /// The content as UTF-16 code units.
  pub fn to_chars(&self) -> Vec<u16> {
    self.chars().into_owned()
  }

  pub fn to_utf8(&self) -> String {
    self.to_string()
  }

  /// A native-encoded copy; lossy for content without native equivalents.
  pub fn native_copy(&self) -> Result<StringValue> {
    match self.text() {
      Text::Native(bytes) => StringValue::from_native_chars(bytes),
      Text::Unicode(_) => StringValue::from_native_chars(&self.to_native_chars()),
    }
  }

  pub fn to_bytes(&self, encoding: TextEncoding) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    out.try_reserve(self.len())?;
    match encoding {
      TextEncoding::Ascii => out.extend(self.codepoints().map(|ch| if ch.is_ascii() { ch as u8 } else { b'?' })),
      TextEncoding::Native => out.extend(self.to_native_chars()),
      TextEncoding::Utf8 => out.extend(self.to_string().into_bytes()),
      TextEncoding::Utf16 | TextEncoding::Utf16Le => {
        out.extend(self.unit_iter().flat_map(u16::to_le_bytes))
      },
      TextEncoding::Utf16Be => out.extend(self.unit_iter().flat_map(u16::to_be_bytes)),
      TextEncoding::Utf32 | TextEncoding::Utf32Le => {
        out.extend(self.codepoints().flat_map(|ch| (ch as u32).to_le_bytes()))
      },
      TextEncoding::Utf32Be => out.extend(self.codepoints().flat_map(|ch| (ch as u32).to_be_bytes())),
      TextEncoding::Windows1252 => out.extend(self.encode_codepage(Codepage::Windows1252)),
      TextEncoding::MacRoman => out.extend(self.encode_codepage(Codepage::MacRoman)),
      TextEncoding::IsoLatin1 => out.extend(self.encode_codepage(Codepage::Latin1)),
    }
    Ok(out)
  }

  fn encode_codepage(&self, codepage: Codepage) -> Vec<u8> {
    if codepage == NATIVE_CODEPAGE {
      return self.to_native_chars();
    }
    self
      .codepoints()
      .map(|ch| codepage.from_unicode(ch).unwrap_or(b'?'))
      .collect()
  }

  /// The numeric value of the content, if it reads as a number. Surrounding
  /// whitespace is ignored and hexadecimal is accepted with a `0x` prefix.
  pub fn number(&self) -> Option<f64> {
    if let Some(cached) = self.number.get() {
      return Some(cached);
    }
    let text = self.to_string();
    let value = parse_number(text.trim())?;
    self.number.set(Some(value));
    Some(value)
  }
}

fn parse_number(text: &str) -> Option<f64> {
  let (negative, digits) = match text.as_bytes().first()? {
    b'-' => (true, &text[1..]),
    b'+' => (false, &text[1..]),
    _ => (false, text),
  };
  let magnitude = if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
    u64::from_str_radix(hex, 16).ok()? as f64
  } else {
    match digits.as_bytes().first()? {
      b'0'..=b'9' | b'.' => digits.parse::<f64>().ok()?,
      _ => return None,
    }
  };
  magnitude
    .is_finite()
    .then_some(if negative { -magnitude } else { magnitude })
}

pub(crate) fn native_lossy(units: &[u16]) -> Vec<u8> {
  if let Some(bytes) = units.iter().map(|&unit| unit_to_native(unit)).collect::<Option<Vec<u8>>>() {
    return bytes;
  }
  let service = unicode::service();
  let boundaries = grapheme::grapheme_boundaries(units);
  let mut out = Vec::with_capacity(units.len());
  let mut lost = 0usize;
  let mut segment = String::new();
  for window in boundaries.windows(2) {
    let piece = &units[window[0]..window[1]];
    if let [unit] = piece {
      if let Some(byte) = unit_to_native(*unit) {
        out.push(byte);
        continue;
      }
    }
    segment.clear();
    segment.extend(unicode::codepoints(piece).map(|(_, ch, _)| ch));
    let composed = service.normalize(&segment, NormalForm::Nfc);
    let mut chars = composed.chars();
    match (chars.next().and_then(native::char_to_native), chars.next()) {
      (Some(byte), None) => out.push(byte),
      _ => {
        lost += 1;
        out.push(b'?');
      },
    }
  }
  if lost > 0 {
    tracing::debug!(lost, "graphemes without a native equivalent replaced");
  }
  out
}
