//! Markup front-end: tokenize HTML and build trees inside a [`dom::Document`].
//!
//! Fragments are parsed into a detached `template` container; whole
//! documents into a detached document node with `html`/`head`/`body`
//! synthesized when the markup omits them.

mod entities;
mod tokenizer;
mod tree_builder;

use memchr::{memchr, memchr2};

pub use crate::tokenizer::{Token, tokenize};
pub use crate::tree_builder::{ParsedDocument, parse_document, parse_fragment, parse_into};

/// ASCII case-insensitive substring test.
pub fn contains_ignore_ascii_case(haystack: &str, needle: &str) -> bool {
    find_ignore_ascii_case(haystack, needle, 0).is_some()
}

/// Byte offset of the first ASCII case-insensitive match of `needle` at or
/// after `from`.
pub fn find_ignore_ascii_case(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    let hay = haystack.as_bytes();
    let needle = needle.as_bytes();
    let n = needle.len();
    if n == 0 {
        return Some(from.min(hay.len()));
    }
    let first = needle[0];
    let (lower, upper) = (first.to_ascii_lowercase(), first.to_ascii_uppercase());
    let mut i = from;
    while i + n <= hay.len() {
        let rel = if lower == upper {
            memchr(lower, &hay[i..])
        } else {
            memchr2(lower, upper, &hay[i..])
        }?;
        let pos = i + rel;
        if pos + n <= hay.len() && hay[pos..pos + n].eq_ignore_ascii_case(needle) {
            return Some(pos);
        }
        i = pos + 1;
    }
    None
}
