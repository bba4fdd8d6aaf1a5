// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Short, display-safe excerpts of raw log messages.
//!
//! An [`Excerpt`] trims surrounding whitespace from a message, caps it at a number of runes,
//! applies an ordered list of byte replacements and finally appends one of the configured
//! [`Marks`]:
//!
//! ```
//! use plog::Excerpt;
//! use plog::Marks;
//!
//! let excerpt = Excerpt::new()
//!     .with_trunc(12)
//!     .with_marks(Marks::new("…", "_EMPTY_", "_BLANK_"))
//!     .with_replace("\n", " ");
//!
//! assert_eq!(excerpt.to_vec(b"  Hello,\nWorld!  "), "Hello, World…".as_bytes());
//! assert_eq!(excerpt.to_vec(b""), b"_EMPTY_");
//! assert_eq!(excerpt.to_vec(b" \t "), b"_BLANK_");
//! ```

use crate::Error;

/// The sentinels and suffix appended to an excerpt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Marks {
    /// Appended when the message was cut off by the rune limit.
    pub truncate: Vec<u8>,
    /// Emitted instead of an excerpt for a zero-length message.
    pub empty: Vec<u8>,
    /// Emitted instead of an excerpt for a message made only of whitespace.
    pub blank: Vec<u8>,
}

impl Marks {
    /// Create marks from the truncate, empty and blank byte sequences, in that order.
    pub fn new(
        truncate: impl Into<Vec<u8>>,
        empty: impl Into<Vec<u8>>,
        blank: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            truncate: truncate.into(),
            empty: empty.into(),
            blank: blank.into(),
        }
    }

    /// The length in bytes of the longest mark.
    pub fn longest(&self) -> usize {
        self.truncate
            .len()
            .max(self.empty.len())
            .max(self.blank.len())
    }
}

/// Excerpt configuration: a rune limit, [`Marks`] and ordered replacement pairs.
///
/// A limit of zero means unlimited.
#[derive(Debug, Clone, Default)]
pub struct Excerpt {
    trunc: usize,
    marks: Marks,
    replace: Vec<(Vec<u8>, Vec<u8>)>,
}

impl Excerpt {
    /// Create an excerpt configuration without a limit, marks or replacements.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of runes kept from the message, excluding marks.
    pub fn with_trunc(mut self, trunc: usize) -> Self {
        self.trunc = trunc;
        self
    }

    /// Set the marks.
    pub fn with_marks(mut self, marks: Marks) -> Self {
        self.marks = marks;
        self
    }

    /// Append a replacement pair.
    ///
    /// Pairs are applied in the order they are added. Each pair replaces every non-overlapping
    /// occurrence of `pattern` before the next pair is considered.
    pub fn with_replace(
        mut self,
        pattern: impl Into<Vec<u8>>,
        replacement: impl Into<Vec<u8>>,
    ) -> Self {
        self.replace.push((pattern.into(), replacement.into()));
        self
    }

    /// The rune limit, zero if unlimited.
    pub fn trunc(&self) -> usize {
        self.trunc
    }

    /// The configured marks.
    pub fn marks(&self) -> &Marks {
        &self.marks
    }

    /// The configured replacement pairs.
    pub fn replacements(&self) -> &[(Vec<u8>, Vec<u8>)] {
        &self.replace
    }

    /// A capacity to reserve for the excerpt of `src` before replacements grow it.
    pub fn capacity_hint(&self, src: &[u8]) -> usize {
        src.len() + self.marks.longest()
    }

    /// Append the excerpt of `src` to `dst` and return the number of bytes appended.
    ///
    /// A message that trims down to nothing is replaced by the blank mark. This never fails; the
    /// result type matches the steps that surround it when a record is built.
    pub fn truncate(&self, dst: &mut Vec<u8>, src: &[u8]) -> Result<usize, Error> {
        Ok(self.write_excerpt(dst, src, &self.marks.blank))
    }

    /// Like [`Excerpt::truncate`], but a zero-length `src` is replaced by the empty mark.
    ///
    /// Falls back to the blank mark when no empty mark is configured.
    pub fn excerpt(&self, dst: &mut Vec<u8>, src: &[u8]) -> Result<usize, Error> {
        Ok(self.append_excerpt(dst, src))
    }

    /// Return the excerpt of `src` as a new buffer.
    pub fn to_vec(&self, src: &[u8]) -> Vec<u8> {
        let mut dst = Vec::with_capacity(self.capacity_hint(src));
        self.append_excerpt(&mut dst, src);
        dst
    }

    fn append_excerpt(&self, dst: &mut Vec<u8>, src: &[u8]) -> usize {
        if !src.is_empty() {
            return self.write_excerpt(dst, src, &self.marks.blank);
        }

        let mark = if self.marks.empty.is_empty() {
            &self.marks.blank
        } else {
            &self.marks.empty
        };
        dst.extend_from_slice(mark);
        mark.len()
    }

    fn write_excerpt(&self, dst: &mut Vec<u8>, src: &[u8], blank: &[u8]) -> usize {
        let base = dst.len();

        let start = skip_leading_space(src);

        let mut end = start;
        let mut runes = 0;
        let mut truncated = false;
        while end < src.len() {
            if self.trunc > 0 && runes >= self.trunc {
                truncated = true;
                break;
            }
            let (_, size) = decode_rune(&src[end..]);
            end += size;
            runes += 1;
        }

        let end = trim_trailing_space(src, start, end);

        dst.extend_from_slice(&src[start..end]);
        self.apply_replacements(dst, base);

        if start == end {
            dst.extend_from_slice(blank);
        } else if truncated {
            dst.extend_from_slice(&self.marks.truncate);
        }

        dst.len() - base
    }

    // Rewrites dst[base..] once per effective pair through a scratch buffer, so source and
    // destination never overlap.
    fn apply_replacements(&self, dst: &mut Vec<u8>, base: usize) {
        let mut scratch = Vec::new();

        for (pattern, replacement) in &self.replace {
            if pattern.is_empty() || pattern == replacement {
                continue;
            }

            let body = &dst[base..];
            let Some(first) = find(body, pattern) else {
                continue;
            };

            scratch.clear();
            scratch.reserve(body.len());
            let mut read = 0;
            let mut next = Some(first);
            while let Some(pos) = next {
                scratch.extend_from_slice(&body[read..read + pos]);
                scratch.extend_from_slice(replacement);
                read += pos + pattern.len();
                next = find(&body[read..], pattern);
            }
            scratch.extend_from_slice(&body[read..]);

            dst.truncate(base);
            dst.extend_from_slice(&scratch);
        }
    }
}

const fn is_ascii_space(b: u8) -> bool {
    matches!(b, b'\t' | b'\n' | 0x0B | 0x0C | b'\r' | b' ')
}

fn is_space(rune: Option<char>) -> bool {
    rune.is_some_and(char::is_whitespace)
}

const fn is_continuation(b: u8) -> bool {
    b & 0xC0 == 0x80
}

/// Decode the first rune of `s`, which must not be empty.
///
/// Invalid or incomplete sequences decode as `None` with a width of one byte.
fn decode_rune(s: &[u8]) -> (Option<char>, usize) {
    let b = s[0];
    if b < 0x80 {
        return (Some(char::from(b)), 1);
    }

    let window = &s[..s.len().min(4)];
    let valid = match std::str::from_utf8(window) {
        Ok(v) => v,
        Err(err) => std::str::from_utf8(&window[..err.valid_up_to()]).unwrap_or_default(),
    };
    match valid.chars().next() {
        Some(c) => (Some(c), c.len_utf8()),
        None => (None, 1),
    }
}

/// Decode the last rune of `s`, which must not be empty.
fn decode_last_rune(s: &[u8]) -> (Option<char>, usize) {
    let end = s.len();
    let b = s[end - 1];
    if b < 0x80 {
        return (Some(char::from(b)), 1);
    }

    let limit = end.saturating_sub(4);
    let mut start = end - 1;
    while start > limit && is_continuation(s[start]) {
        start -= 1;
    }

    let (rune, size) = decode_rune(&s[start..end]);
    if start + size != end {
        return (None, 1);
    }
    (rune, size)
}

fn skip_leading_space(src: &[u8]) -> usize {
    let mut start = 0;
    while start < src.len() {
        let b = src[start];
        if b < 0x80 {
            if !is_ascii_space(b) {
                break;
            }
            start += 1;
        } else {
            let (rune, size) = decode_rune(&src[start..]);
            if !is_space(rune) {
                break;
            }
            start += size;
        }
    }
    start
}

fn trim_trailing_space(src: &[u8], start: usize, mut end: usize) -> usize {
    while end > start {
        let b = src[end - 1];
        if b < 0x80 {
            if !is_ascii_space(b) {
                break;
            }
            end -= 1;
        } else {
            let (rune, size) = decode_last_rune(&src[start..end]);
            if !is_space(rune) {
                break;
            }
            end -= size;
        }
    }
    end
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use rand::Rng;
    use rand::seq::IndexedRandom;

    use super::*;

    fn excerpt(e: &Excerpt, src: &str) -> String {
        String::from_utf8(e.to_vec(src.as_bytes())).unwrap()
    }

    fn marks() -> Marks {
        Marks::new("…", "_EMPTY_", "_BLANK_")
    }

    #[test]
    fn test_noop_replacement_keeps_message() {
        let e = Excerpt::new().with_replace("!", "!");
        assert_eq!(excerpt(&e, "Hello, World!"), "Hello, World!");
        assert_eq!(excerpt(&e, "!!!"), "!!!");
    }

    #[test]
    fn test_empty_pattern_is_skipped() {
        let e = Excerpt::new().with_replace("", "x");
        assert_eq!(excerpt(&e, "abc"), "abc");
    }

    #[test]
    fn test_trim_ascii_whitespace() {
        let e = Excerpt::new();
        assert_eq!(excerpt(&e, " \t\nHello \n\t"), "Hello");
        assert_eq!(excerpt(&e, "\x0b\x0cHello, World\r\n"), "Hello, World");
        assert_eq!(excerpt(&e, "  inner  spaces stay  "), "inner  spaces stay");
    }

    #[test]
    fn test_trim_unicode_whitespace() {
        let e = Excerpt::new();
        assert_eq!(excerpt(&e, "\u{a0}\u{3000}Hello\u{2009}\u{85}"), "Hello");
        assert_eq!(excerpt(&e, "\u{2028} \tПривет, мир\u{a0} \n"), "Привет, мир");
        assert_eq!(excerpt(&e, "\u{1680}日本語\u{202f}"), "日本語");
    }

    #[test]
    fn test_trim_random_padding() {
        const SPACES: &[&str] = &[
            " ", "\t", "\n", "\x0b", "\x0c", "\r", "\u{a0}", "\u{2003}", "\u{3000}",
        ];
        const BODY: &[&str] = &["a", "Z", "9", "!", "é", "ж", "語", "🦀"];

        let mut rng = rand::rng();
        let e = Excerpt::new();
        for _ in 0..200 {
            let body: String = (0..rng.random_range(1..16))
                .map(|_| *BODY.choose(&mut rng).unwrap())
                .collect();
            let lead: String = (0..rng.random_range(0..6))
                .map(|_| *SPACES.choose(&mut rng).unwrap())
                .collect();
            let tail: String = (0..rng.random_range(0..6))
                .map(|_| *SPACES.choose(&mut rng).unwrap())
                .collect();
            let src = format!("{lead}{body}{tail}");
            assert_eq!(excerpt(&e, &src), body, "input {src:?}");
        }
    }

    #[test]
    fn test_rune_limit_bound() {
        const RUNES: &[char] = &['a', ' ', 'é', 'ж', '語', '🦀', '\n', '\u{a0}'];

        let mut rng = rand::rng();
        for _ in 0..200 {
            let limit = rng.random_range(1..24);
            let src: String = (0..rng.random_range(0..48))
                .map(|_| *RUNES.choose(&mut rng).unwrap())
                .collect();
            let e = Excerpt::new().with_trunc(limit);
            let out = excerpt(&e, &src);
            assert!(
                out.chars().count() <= limit,
                "{out:?} exceeds {limit} runes for input {src:?}"
            );
        }
    }

    #[test]
    fn test_truncate_mark() {
        let e = Excerpt::new().with_trunc(12);
        assert_eq!(excerpt(&e, "Hello, World!"), "Hello, World");

        let e = Excerpt::new().with_trunc(12).with_marks(marks());
        assert_eq!(excerpt(&e, "Hello, World!"), "Hello, World…");
    }

    #[test]
    fn test_limit_counts_runes_not_bytes() {
        let e = Excerpt::new().with_trunc(5).with_marks(marks());
        assert_eq!(excerpt(&e, "héllo wörld"), "héllo…");
        assert_eq!(excerpt(&e, "🦀🦀🦀🦀🦀🦀"), "🦀🦀🦀🦀🦀…");

        // the cut lands on a space, which is trimmed before the mark
        let e = Excerpt::new().with_trunc(6).with_marks(marks());
        assert_eq!(excerpt(&e, "héllo wörld"), "héllo…");
    }

    #[test]
    fn test_exact_limit_is_not_truncated() {
        let e = Excerpt::new().with_trunc(5).with_marks(marks());
        assert_eq!(excerpt(&e, "Hello"), "Hello");
        assert_eq!(excerpt(&e, "   Hello"), "Hello");
        assert_eq!(excerpt(&e, "Hello   "), "Hello…");
    }

    #[test]
    fn test_zero_limit_is_unlimited() {
        let e = Excerpt::new().with_marks(marks());
        let src = "x".repeat(10_000);
        assert_eq!(excerpt(&e, &src), src);
    }

    #[test]
    fn test_empty_and_blank_marks() {
        let e = Excerpt::new().with_marks(marks());
        assert_eq!(excerpt(&e, ""), "_EMPTY_");
        assert_eq!(excerpt(&e, " "), "_BLANK_");
        assert_eq!(excerpt(&e, "\n\t\u{3000}"), "_BLANK_");

        let e = Excerpt::new().with_marks(Marks::new("…", "", "_BLANK_"));
        assert_eq!(excerpt(&e, ""), "_BLANK_");

        let e = Excerpt::new();
        assert_eq!(excerpt(&e, ""), "");
        assert_eq!(excerpt(&e, "  "), "");
    }

    #[test]
    fn test_truncate_uses_blank_mark_for_empty_input() {
        let e = Excerpt::new().with_marks(marks());
        let mut dst = vec![];
        assert_eq!(e.truncate(&mut dst, b"").unwrap(), 7);
        assert_eq!(dst, b"_BLANK_");
    }

    #[test]
    fn test_replacements() {
        let e = Excerpt::new().with_replace("\n", " ");
        assert_eq!(excerpt(&e, "Hello\n,\nWorld\n!"), "Hello , World !");

        let e = Excerpt::new().with_replace("foo", "f").with_replace("bar", "b");
        assert_eq!(excerpt(&e, "foobar"), "fb");

        let e = Excerpt::new().with_replace("f", "foo").with_replace("b", "bar");
        assert_eq!(excerpt(&e, "fb"), "foobar");

        let e = Excerpt::new().with_replace("foo", "").with_replace("bar", "");
        assert_eq!(excerpt(&e, "foobar foobar"), " ");
    }

    #[test]
    fn test_replacement_does_not_rescan_inserted_text() {
        let e = Excerpt::new().with_replace("a", "aa");
        assert_eq!(excerpt(&e, "aaa"), "aaaaaa");

        let e = Excerpt::new().with_replace("ab", "b");
        assert_eq!(excerpt(&e, "aab"), "ab");
    }

    #[test]
    fn test_replacement_pairs_apply_in_order() {
        let e = Excerpt::new().with_replace("a", "b").with_replace("b", "c");
        assert_eq!(excerpt(&e, "ab"), "cc");

        let e = Excerpt::new().with_replace("b", "c").with_replace("a", "b");
        assert_eq!(excerpt(&e, "ab"), "bc");
    }

    #[test]
    fn test_replacement_after_truncation() {
        let e = Excerpt::new()
            .with_trunc(5)
            .with_marks(marks())
            .with_replace("l", "LLL");
        assert_eq!(excerpt(&e, "Hello, World!"), "HeLLLLLLo…");
    }

    #[test]
    fn test_replacement_to_nothing_emits_no_mark() {
        let e = Excerpt::new().with_marks(marks()).with_replace("foo", "");
        assert_eq!(excerpt(&e, "foo"), "");
    }

    #[test]
    fn test_invalid_utf8_is_kept() {
        let e = Excerpt::new();
        assert_eq!(e.to_vec(b" \xffabc\xfe "), b"\xffabc\xfe");

        let e = Excerpt::new().with_trunc(2).with_marks(marks());
        let expected = [&b"\xffa"[..], "…".as_bytes()].concat();
        assert_eq!(e.to_vec(b"\xffabc"), expected);
        assert_eq!(e.to_vec(b"\xe6\x97"), b"\xe6\x97");
    }

    #[test]
    fn test_appends_to_existing_buffer() {
        let e = Excerpt::new().with_trunc(5).with_marks(marks());
        let mut dst = b"excerpt=".to_vec();
        let n = e.excerpt(&mut dst, b"  Hello, World!").unwrap();
        assert_eq!(n, "Hello…".len());
        assert_eq!(dst, "excerpt=Hello…".as_bytes());
    }

    #[test]
    fn test_stable_under_repetition() {
        let e = Excerpt::new().with_trunc(32).with_marks(marks()).with_replace("\n", " ");
        for src in ["Hello, World!", "Привет", "a b c", "日本語のテキスト"] {
            let once = e.to_vec(src.as_bytes());
            let twice = e.to_vec(&once);
            assert_eq!(once, twice);
            assert_eq!(once, src.as_bytes());
        }
    }

    #[test]
    fn test_to_vec_matches_excerpt() {
        let e = Excerpt::new().with_trunc(5).with_marks(marks());
        for src in ["", "   ", "Hello, World!", "Hi"] {
            let mut dst = vec![];
            let n = e.excerpt(&mut dst, src.as_bytes()).unwrap();
            assert_eq!(n, dst.len());
            assert_eq!(e.to_vec(src.as_bytes()), dst, "input {src:?}");
        }
    }

    #[test]
    fn test_accessors() {
        let e = Excerpt::new()
            .with_trunc(7)
            .with_marks(marks())
            .with_replace("\t", " ");
        assert_eq!(e.trunc(), 7);
        assert_eq!(e.marks(), &marks());
        assert_eq!(e.replacements(), &[(b"\t".to_vec(), b" ".to_vec())]);
    }

    #[test]
    fn test_marks_longest() {
        assert_eq!(marks().longest(), "_EMPTY_".len());
        assert_eq!(Marks::default().longest(), 0);
    }
}
