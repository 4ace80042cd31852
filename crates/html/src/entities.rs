//! Character reference decoding.
//!
//! Contract:
//! - Named references decoded: `&amp;`, `&lt;`, `&gt;`, `&quot;`, `&apos;`, `&nbsp;`.
//! - Numeric references decode only when semicolon-terminated and a valid
//!   Unicode scalar: `&#215;`, `&#xD7;`.
//! - Anything else (unknown names, missing `;`, overlong digit runs) is kept
//!   verbatim.

const NAMED: &[(&[u8], char)] = &[
    (b"&amp;", '&'),
    (b"&lt;", '<'),
    (b"&gt;", '>'),
    (b"&quot;", '"'),
    (b"&apos;", '\''),
    (b"&nbsp;", '\u{00A0}'),
];

const MAX_HEX_DIGITS: usize = 6; // 0x10FFFF
const MAX_DEC_DIGITS: usize = 7; // 1114111

pub(crate) fn decode_entities(s: &str) -> String {
    let Some(first) = memchr::memchr(b'&', s.as_bytes()) else {
        return s.to_string();
    };
    let bytes = s.as_bytes();
    let mut out = String::with_capacity(s.len());
    out.push_str(&s[..first]);
    let mut i = first;

    while i < bytes.len() {
        if bytes[i] != b'&' {
            let next = memchr::memchr(b'&', &bytes[i..]).map_or(bytes.len(), |rel| i + rel);
            out.push_str(&s[i..next]);
            i = next;
            continue;
        }

        if let Some((pattern, ch)) = NAMED
            .iter()
            .find(|(pattern, _)| bytes[i..].starts_with(pattern))
        {
            out.push(*ch);
            i += pattern.len();
            continue;
        }

        if bytes[i..].starts_with(b"&#") {
            let hex = matches!(bytes.get(i + 2), Some(b'x' | b'X'));
            let digits_start = if hex { i + 3 } else { i + 2 };
            let limit = if hex { MAX_HEX_DIGITS } else { MAX_DEC_DIGITS };
            if let Some(end) = scan_digits(bytes, digits_start, limit, hex) {
                let digits = &s[digits_start..end];
                let radix = if hex { 16 } else { 10 };
                match u32::from_str_radix(digits, radix).ok().and_then(char::from_u32) {
                    Some(ch) => out.push(ch),
                    None => out.push_str(&s[i..=end]),
                }
                i = end + 1;
                continue;
            }
            i = copy_malformed(&mut out, s, i);
            continue;
        }

        out.push('&');
        i += 1;
    }

    out
}

/// Position of the terminating `;` when `bytes[start..]` is a bounded run of
/// digits followed by `;`.
fn scan_digits(bytes: &[u8], start: usize, limit: usize, hex: bool) -> Option<usize> {
    let mut j = start;
    while j < bytes.len() {
        let b = bytes[j];
        if b == b';' {
            return (j > start).then_some(j);
        }
        let ok = if hex { b.is_ascii_hexdigit() } else { b.is_ascii_digit() };
        if !ok || j - start == limit {
            return None;
        }
        j += 1;
    }
    None
}

/// Copy a malformed reference through unchanged, stopping before whitespace
/// or another `&` so the next reference can still decode.
fn copy_malformed(out: &mut String, s: &str, start: usize) -> usize {
    let bytes = s.as_bytes();
    let mut j = start + 1;
    while j < bytes.len() {
        match bytes[j] {
            b';' => {
                out.push_str(&s[start..=j]);
                return j + 1;
            }
            b'&' => break,
            b if b.is_ascii_whitespace() => break,
            _ => j += 1,
        }
    }
    out.push_str(&s[start..j]);
    j
}
