pub mod buffer;
pub mod convert;
pub mod edit;
pub mod error;
pub mod format;
pub mod index;
pub mod options;
pub mod replace;
pub mod search;
pub mod value;

pub use convert::TextEncoding;
pub use error::{
  Result,
  StringError,
};
pub use format::{
  FormatArg,
  format,
};
pub use index::{
  IndexSpace,
  Segments,
};
pub use options::StringOptions;
pub use replace::{
  DelimitedOffset,
  SplitMap,
};
pub use value::{
  Flags,
  MutableString,
  StringData,
  StringValue,
  Text,
};
