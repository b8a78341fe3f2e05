pub mod chars;
pub mod grapheme;
pub mod line_ending;
pub mod native;
pub mod scan;
pub mod unicode;
