//! Small, forgiving HTML tokenizer.
//!
//! Tag and attribute names use the ASCII class `[A-Za-z0-9:_-]` and are
//! lowercased. Raw-text elements (`script`, `style`, ...) and escapable
//! raw-text elements (`textarea`, `title`) swallow everything up to their own
//! close tag; only the latter decode character references.
//!
//! Known limitations: no parse-error recovery beyond skipping to `>`, no
//! CDATA sections, and a close tag for raw text only tolerates ASCII
//! whitespace before `>`.

use crate::entities::decode_entities;
use dom::is_void_element;
use memchr::memchr;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    Doctype(String),
    StartTag {
        name: String,
        attributes: Vec<(String, String)>,
        self_closing: bool,
    },
    EndTag(String),
    Comment(String),
    Text(String),
}

const COMMENT_START: &str = "<!--";
const COMMENT_END: &str = "-->";

fn starts_with_ignore_ascii_case_at(haystack: &[u8], start: usize, needle: &[u8]) -> bool {
    haystack
        .get(start..start + needle.len())
        .is_some_and(|window| window.eq_ignore_ascii_case(needle))
}

fn is_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b':'
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum TextKind {
    Raw,
    Escapable,
}

fn text_kind(name: &str) -> Option<TextKind> {
    match name {
        "script" | "style" | "xmp" | "iframe" | "noembed" | "noframes" => Some(TextKind::Raw),
        "textarea" | "title" => Some(TextKind::Escapable),
        _ => None,
    }
}

/// Find `</name` followed by optional ASCII whitespace and `>`.
/// Returns `(start_of_close_tag, end_after_gt)`.
fn find_close_tag(haystack: &str, name: &str) -> Option<(usize, usize)> {
    let bytes = haystack.as_bytes();
    let len = bytes.len();
    let n = name.len() + 2;
    let mut i = 0;
    while i + n <= len {
        i += memchr(b'<', &bytes[i..])?;
        if i + n > len {
            return None;
        }
        if bytes[i + 1] == b'/' && starts_with_ignore_ascii_case_at(bytes, i + 2, name.as_bytes()) {
            let mut k = i + n;
            while k < len && bytes[k].is_ascii_whitespace() {
                k += 1;
            }
            if k < len && bytes[k] == b'>' {
                return Some((i, k + 1));
            }
        }
        i += 1;
    }
    None
}

pub fn tokenize(input: &str) -> Vec<Token> {
    let mut out = Vec::new();
    let bytes = input.as_bytes();
    let len = bytes.len();
    let mut i = 0;

    // Slices are only cut at ASCII structural bytes, so every endpoint is a
    // UTF-8 boundary.
    while i < len {
        if bytes[i] != b'<' {
            let end = memchr(b'<', &bytes[i..]).map_or(len, |rel| i + rel);
            push_text(&mut out, decode_entities(&input[i..end]));
            i = end;
            continue;
        }

        if input[i..].starts_with(COMMENT_START) {
            let body_start = i + COMMENT_START.len();
            match input[body_start..].find(COMMENT_END) {
                Some(rel) => {
                    out.push(Token::Comment(input[body_start..body_start + rel].to_string()));
                    i = body_start + rel + COMMENT_END.len();
                }
                None => {
                    out.push(Token::Comment(input[body_start..].to_string()));
                    i = len;
                }
            }
            continue;
        }

        if starts_with_ignore_ascii_case_at(bytes, i, b"<!doctype") {
            let rest = &input[i + 9..];
            let end = rest.find('>').unwrap_or(rest.len());
            out.push(Token::Doctype(rest[..end].trim().to_ascii_lowercase()));
            i = (i + 9 + end + 1).min(len);
            continue;
        }

        let next = bytes.get(i + 1).copied();
        match next {
            Some(b'!' | b'?') => {
                // Bogus comment: `<!...>` or `<?...>`.
                let body_start = i + 2;
                let end = memchr(b'>', &bytes[body_start..]).map_or(len, |rel| body_start + rel);
                out.push(Token::Comment(input[body_start..end].to_string()));
                i = (end + 1).min(len);
            }
            Some(b'/') if bytes.get(i + 2).is_some_and(|b| b.is_ascii_alphabetic()) => {
                let name_start = i + 2;
                let mut j = name_start;
                while j < len && is_name_char(bytes[j]) {
                    j += 1;
                }
                let name = input[name_start..j].to_ascii_lowercase();
                let end = memchr(b'>', &bytes[j..]).map_or(len, |rel| j + rel);
                out.push(Token::EndTag(name));
                i = (end + 1).min(len);
            }
            Some(b) if b.is_ascii_alphabetic() => {
                i = start_tag(input, i, &mut out);
            }
            _ => {
                push_text(&mut out, "<".to_string());
                i += 1;
            }
        }
    }

    log::trace!(target: "html.tokenizer", "tokenized {} bytes into {} tokens", len, out.len());
    out
}

fn push_text(out: &mut Vec<Token>, text: String) {
    if text.is_empty() {
        return;
    }
    if let Some(Token::Text(previous)) = out.last_mut() {
        previous.push_str(&text);
    } else {
        out.push(Token::Text(text));
    }
}

/// Tokenize the start tag at `bytes[i] == '<'`, plus the body of a raw-text
/// element. Returns the position after everything consumed.
fn start_tag(input: &str, i: usize, out: &mut Vec<Token>) -> usize {
    let bytes = input.as_bytes();
    let len = bytes.len();
    let name_start = i + 1;
    let mut k = name_start;
    while k < len && is_name_char(bytes[k]) {
        k += 1;
    }
    let name = input[name_start..k].to_ascii_lowercase();
    let mut attributes: Vec<(String, String)> = Vec::new();
    let mut self_closing = false;

    loop {
        while k < len && bytes[k].is_ascii_whitespace() {
            k += 1;
        }
        if k >= len {
            break;
        }
        match bytes[k] {
            b'>' => {
                k += 1;
                break;
            }
            b'/' => {
                if bytes.get(k + 1) == Some(&b'>') {
                    self_closing = true;
                    k += 2;
                    break;
                }
                k += 1;
                continue;
            }
            _ => {}
        }

        let attr_start = k;
        while k < len && is_name_char(bytes[k]) {
            k += 1;
        }
        if attr_start == k {
            k += 1;
            continue;
        }
        let attr_name = input[attr_start..k].to_ascii_lowercase();

        while k < len && bytes[k].is_ascii_whitespace() {
            k += 1;
        }
        let mut value = String::new();
        if k < len && bytes[k] == b'=' {
            k += 1;
            while k < len && bytes[k].is_ascii_whitespace() {
                k += 1;
            }
            if k < len && (bytes[k] == b'"' || bytes[k] == b'\'') {
                let quote = bytes[k];
                let value_start = k + 1;
                let value_end =
                    memchr(quote, &bytes[value_start..]).map_or(len, |rel| value_start + rel);
                value = decode_entities(&input[value_start..value_end]);
                k = (value_end + 1).min(len);
            } else {
                let value_start = k;
                while k < len && !bytes[k].is_ascii_whitespace() && bytes[k] != b'>' {
                    if bytes[k] == b'/' && bytes.get(k + 1) == Some(&b'>') {
                        break;
                    }
                    k += 1;
                }
                value = decode_entities(&input[value_start..k]);
            }
        }
        // First occurrence wins, as in browsers.
        if !attributes.iter().any(|(existing, _)| *existing == attr_name) {
            attributes.push((attr_name, value));
        }
    }

    let kind = text_kind(&name);
    let void = is_void_element(&name);
    out.push(Token::StartTag {
        name: name.clone(),
        attributes,
        self_closing: self_closing || void,
    });

    let Some(kind) = kind else {
        return k;
    };
    if self_closing {
        return k;
    }
    let body = &input[k..];
    let (raw, consumed) = match find_close_tag(body, &name) {
        Some((start, end)) => (&body[..start], end),
        None => (body, body.len()),
    };
    let text = match kind {
        TextKind::Raw => raw.to_string(),
        TextKind::Escapable => decode_entities(raw),
    };
    if !text.is_empty() {
        out.push(Token::Text(text));
    }
    out.push(Token::EndTag(name));
    k + consumed
}
