//! Benchmarks for index mapping and searching across both encodings.
//!
//! Run with: `cargo bench -p the-string --bench index`

use divan::{
  Bencher,
  black_box,
};
use the_string::{
  IndexSpace,
  MutableString,
  StringOptions,
  StringValue,
};

fn main() {
  divan::main();
}

fn repeat_text(line: &str, units: usize) -> StringValue {
  let chars: Vec<u16> = line.encode_utf16().cycle().take(units).collect();
  StringValue::from_chars(&chars).unwrap()
}

fn make_native_text(size: usize) -> StringValue {
  let chars: Vec<u8> = b"The quick brown fox jumps over the lazy dog. "
    .iter()
    .copied()
    .cycle()
    .take(size)
    .collect();
  StringValue::from_native_chars(&chars).unwrap()
}

fn make_combining_text(size: usize) -> StringValue {
  repeat_text("cafe\u{0301} ", size)
}

fn make_mixed_text(size: usize) -> StringValue {
  repeat_text("Hello 世界! 🎉 Test テスト 😀 ", size)
}

const SIZES: [usize; 3] = [64, 1024, 16384];

mod map {
  use super::*;

  #[divan::bench(args = SIZES)]
  fn grapheme_native(bencher: Bencher, size: usize) {
    let text = make_native_text(size);
    bencher.bench(|| black_box(&text).map_grapheme_indices(black_box(size / 4..size / 2)));
  }

  #[divan::bench(args = SIZES)]
  fn grapheme_combining(bencher: Bencher, size: usize) {
    let text = make_combining_text(size);
    bencher.bench(|| black_box(&text).map_grapheme_indices(black_box(size / 8..size / 4)));
  }

  #[divan::bench(args = SIZES)]
  fn codepoint_mixed(bencher: Bencher, size: usize) {
    let text = make_mixed_text(size);
    bencher.bench(|| black_box(&text).map_codepoint_indices(black_box(size / 8..size / 4)));
  }

  #[divan::bench(args = SIZES)]
  fn true_words_mixed(bencher: Bencher, size: usize) {
    let text = make_mixed_text(size);
    bencher.bench(|| black_box(&text).segment_count(IndexSpace::TrueWord));
  }
}

mod search {
  use super::*;

  #[divan::bench(args = SIZES)]
  fn caseless_native(bencher: Bencher, size: usize) {
    let text = make_native_text(size);
    let needle: StringValue = "LAZY CAT".parse().unwrap();
    bencher.bench(|| black_box(&text).count(black_box(&needle), StringOptions::Caseless));
  }

  #[divan::bench(args = SIZES)]
  fn folded_mixed(bencher: Bencher, size: usize) {
    let text = make_mixed_text(size);
    let needle: StringValue = "TEST".parse().unwrap();
    bencher.bench(|| black_box(&text).count(black_box(&needle), StringOptions::Folded));
  }

  #[divan::bench(args = SIZES)]
  fn replace_native(bencher: Bencher, size: usize) {
    let text = make_native_text(size);
    let (from, to): (StringValue, StringValue) = ("fox".parse().unwrap(), "wolf".parse().unwrap());
    bencher.bench(|| {
      let mut copy: MutableString = text.mutable_copy();
      copy.find_and_replace(&from, &to, StringOptions::Exact).unwrap()
    });
  }
}
