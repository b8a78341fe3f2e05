use std::{
  fs,
  io::Error as IOError,
  path::Path,
};

use serde::Deserialize;
use the_string::{
  IndexSpace,
  StringOptions,
  StringValue,
};
use toml::de::Error as TomlError;

/// The index space `char` clauses count in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CharChunk {
  #[default]
  Grapheme,
  Codepoint,
  Codeunit,
}

impl CharChunk {
  pub fn space(self) -> IndexSpace {
    match self {
      CharChunk::Grapheme => IndexSpace::Grapheme,
      CharChunk::Codepoint => IndexSpace::Codepoint,
      CharChunk::Codeunit => IndexSpace::CodeUnit,
    }
  }
}

pub const DEFAULT_RECURSION_LIMIT: usize = 64;
pub const DEFAULT_RANDOM_SEED: u64 = 0x2545_F491_4F6C_DD1D;

#[derive(Debug, Clone, PartialEq)]
pub struct ChunkConfig {
  pub line_delimiter:  StringValue,
  pub item_delimiter:  StringValue,
  pub case_sensitive:  bool,
  pub form_sensitive:  bool,
  /// Deepest chain of chunk expressions evaluated inside one another.
  pub recursion_limit: usize,
  pub random_seed:     u64,
  pub char_chunk:      CharChunk,
}

impl ChunkConfig {
  /// Options delimiters and names are matched with.
  pub fn options(&self) -> StringOptions {
    StringOptions::from_sensitivity(self.case_sensitive, self.form_sensitive)
  }
}

impl Default for ChunkConfig {
  fn default() -> Self {
    Self {
      line_delimiter:  StringValue::from_native_chars(b"\n").unwrap_or_default(),
      item_delimiter:  StringValue::from_native_chars(b",").unwrap_or_default(),
      case_sensitive:  false,
      form_sensitive:  false,
      recursion_limit: DEFAULT_RECURSION_LIMIT,
      random_seed:     DEFAULT_RANDOM_SEED,
      char_chunk:      CharChunk::default(),
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct ConfigRaw {
  pub line_delimiter:  Option<String>,
  pub item_delimiter:  Option<String>,
  pub case_sensitive:  Option<bool>,
  pub form_sensitive:  Option<bool>,
  pub recursion_limit: Option<usize>,
  pub random_seed:     Option<u64>,
  pub char_chunk:      Option<CharChunk>,
}

impl ConfigRaw {
  /// Fields set in `local` replace those of `self`.
  fn merge(self, local: ConfigRaw) -> ConfigRaw {
    ConfigRaw {
      line_delimiter:  local.line_delimiter.or(self.line_delimiter),
      item_delimiter:  local.item_delimiter.or(self.item_delimiter),
      case_sensitive:  local.case_sensitive.or(self.case_sensitive),
      form_sensitive:  local.form_sensitive.or(self.form_sensitive),
      recursion_limit: local.recursion_limit.or(self.recursion_limit),
      random_seed:     local.random_seed.or(self.random_seed),
      char_chunk:      local.char_chunk.or(self.char_chunk),
    }
  }

  fn into_config(self) -> Result<ChunkConfig, ConfigLoadError> {
    let defaults = ChunkConfig::default();
    let delimiter = |value: Option<String>, field: &'static str, default: StringValue| {
      match value {
        Some(text) if text.is_empty() => Err(ConfigLoadError::Invalid(field)),
        Some(text) => text.parse().map_err(|_| ConfigLoadError::Invalid(field)),
        None => Ok(default),
      }
    };
    if self.recursion_limit == Some(0) {
      return Err(ConfigLoadError::Invalid("recursion-limit"));
    }
    Ok(ChunkConfig {
      line_delimiter:  delimiter(self.line_delimiter, "line-delimiter", defaults.line_delimiter)?,
      item_delimiter:  delimiter(self.item_delimiter, "item-delimiter", defaults.item_delimiter)?,
      case_sensitive:  self.case_sensitive.unwrap_or(defaults.case_sensitive),
      form_sensitive:  self.form_sensitive.unwrap_or(defaults.form_sensitive),
      recursion_limit: self.recursion_limit.unwrap_or(defaults.recursion_limit),
      random_seed:     self.random_seed.unwrap_or(defaults.random_seed),
      char_chunk:      self.char_chunk.unwrap_or(defaults.char_chunk),
    })
  }
}

#[derive(Debug)]
pub enum ConfigLoadError {
  BadConfig(TomlError),
  Error(IOError),
  /// A field parsed but holds a value the engine cannot use.
  Invalid(&'static str),
}

impl std::fmt::Display for ConfigLoadError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::BadConfig(err) => write!(f, "Failed to parse chunk config: {err}"),
      Self::Error(err) => write!(f, "Failed to read chunk config: {err}"),
      Self::Invalid(field) => write!(f, "Invalid value for '{field}' in chunk config"),
    }
  }
}

impl std::error::Error for ConfigLoadError {}

impl ChunkConfig {
  /// Builds the configuration from a global and a project-local TOML
  /// document. Settings in `local` take precedence. A missing file is
  /// skipped but a malformed one is an error.
  pub fn load(
    global: Result<String, ConfigLoadError>,
    local: Result<String, ConfigLoadError>,
  ) -> Result<ChunkConfig, ConfigLoadError> {
    let global_config: Result<ConfigRaw, ConfigLoadError> =
      global.and_then(|file| toml::from_str(&file).map_err(ConfigLoadError::BadConfig));
    let local_config: Result<ConfigRaw, ConfigLoadError> =
      local.and_then(|file| toml::from_str(&file).map_err(ConfigLoadError::BadConfig));

    let raw = match (global_config, local_config) {
      (Ok(global), Ok(local)) => global.merge(local),
      (_, Err(ConfigLoadError::BadConfig(err))) | (Err(ConfigLoadError::BadConfig(err)), _) => {
        return Err(ConfigLoadError::BadConfig(err));
      },
      (Ok(config), Err(_)) | (Err(_), Ok(config)) => config,
      (Err(err), Err(_)) => return Err(err),
    };

    raw.into_config()
  }

  pub fn load_files(global: &Path, local: &Path) -> Result<ChunkConfig, ConfigLoadError> {
    let global_config = fs::read_to_string(global).map_err(ConfigLoadError::Error);
    let local_config = fs::read_to_string(local).map_err(ConfigLoadError::Error);
    Self::load(global_config, local_config)
  }

  /// Like [`ChunkConfig::load_files`], falling back to the defaults when
  /// neither file can be used.
  pub fn load_files_or_default(global: &Path, local: &Path) -> ChunkConfig {
    match Self::load_files(global, local) {
      Ok(config) => config,
      Err(ConfigLoadError::Error(err)) if err.kind() == std::io::ErrorKind::NotFound => {
        tracing::debug!("no chunk config found, using defaults");
        ChunkConfig::default()
      },
      Err(err) => {
        tracing::warn!(%err, "failed to load chunk config, using defaults");
        ChunkConfig::default()
      },
    }
  }
}
