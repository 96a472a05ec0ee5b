//! Pure text transforms applied before the second parse attempt.
//!
//! Each transform takes the whole candidate text and returns a new one. They
//! run in the order listed in [`NORMALIZERS`]. String literals are copied
//! through untouched by every transform that rewrites structure, so quoted
//! values containing colons, commas or `//` survive.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

lazy_static! {
    static ref CODE_FENCE: Regex = Regex::new(r"```[A-Za-z0-9_+-]*").unwrap();
}

/// A named text transform.
#[derive(Clone, Copy)]
pub struct Normalizer {
    pub name: &'static str,
    pub apply: fn(&str) -> String,
}

impl std::fmt::Debug for Normalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Normalizer").field("name", &self.name).finish()
    }
}

/// Transforms applied, in order, by [`normalize`].
pub const NORMALIZERS: &[Normalizer] = &[
    Normalizer {
        name: "strip_code_fences",
        apply: strip_code_fences,
    },
    Normalizer {
        name: "replace_smart_quotes",
        apply: replace_smart_quotes,
    },
    Normalizer {
        name: "unescape_single_quotes",
        apply: unescape_single_quotes,
    },
    Normalizer {
        name: "quote_bare_values",
        apply: quote_bare_values,
    },
    Normalizer {
        name: "strip_trailing_commas",
        apply: strip_trailing_commas,
    },
    Normalizer {
        name: "quote_bare_keys",
        apply: quote_bare_keys,
    },
    Normalizer {
        name: "strip_line_comments",
        apply: strip_line_comments,
    },
    Normalizer {
        name: "collapse_newlines",
        apply: collapse_newlines,
    },
];

/// Output of [`normalize`].
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub text: String,
    /// Names of the transforms that changed the text, in the order they ran.
    pub applied: Vec<&'static str>,
}

/// Runs every transform of [`NORMALIZERS`] and trims the result.
pub fn normalize(raw: &str) -> Normalized {
    let mut text = raw.to_string();
    let mut applied = Vec::new();
    for normalizer in NORMALIZERS {
        let next = (normalizer.apply)(&text);
        if next != text {
            debug!(transform = normalizer.name, "Normalizer rewrote the reply");
            applied.push(normalizer.name);
            text = next;
        }
    }
    Normalized {
        text: text.trim().to_string(),
        applied,
    }
}

/// Removes markdown code fence markers (```` ``` ```` and ```` ```json ````).
pub fn strip_code_fences(text: &str) -> String {
    CODE_FENCE.replace_all(text, "").into_owned()
}

/// Replaces typographic quotes with their ASCII equivalents.
pub fn replace_smart_quotes(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' => '\'',
            '\u{201C}' | '\u{201D}' => '"',
            other => other,
        })
        .collect()
}

/// `\'` is not a valid JSON escape.
pub fn unescape_single_quotes(text: &str) -> String {
    text.replace("\\'", "'")
}

/// Quotes scalar values following a `key:` that are neither quoted nor JSON
/// literals, e.g. `mood: happy` becomes `mood: "happy"`.
pub fn quote_bare_values(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 16);
    let mut depth = 0usize;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if starts_literal(c, depth) {
            i = copy_string_literal(&chars, i, &mut out);
            continue;
        }
        out.push(c);
        i += 1;
        depth = track_depth(depth, c);
        if c != ':' || depth == 0 {
            continue;
        }

        // Value position: keep leading whitespace as-is.
        while i < chars.len() && chars[i].is_whitespace() && chars[i] != '\n' {
            out.push(chars[i]);
            i += 1;
        }
        let Some(&next) = chars.get(i) else { break };
        if is_quote(next) || matches!(next, '{' | '[' | '\n' | '\r' | ',' | '}' | ']') {
            continue;
        }

        let start = i;
        while i < chars.len() && !matches!(chars[i], ',' | '}' | ']' | '\n' | '\r') {
            i += 1;
        }
        let raw_value: String = chars[start..i].iter().collect();
        let value = raw_value.trim_end();
        let trailing = &raw_value[value.len()..];
        if is_json_literal(value) {
            out.push_str(value);
        } else {
            out.push('"');
            out.push_str(&escape_json_string(value));
            out.push('"');
        }
        out.push_str(trailing);
    }

    out
}

/// Drops a `,` that directly precedes a closing `}` or `]`.
pub fn strip_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut depth = 0usize;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if starts_literal(c, depth) {
            i = copy_string_literal(&chars, i, &mut out);
            continue;
        }
        if c == ',' {
            let mut j = i + 1;
            while j < chars.len() && chars[j].is_whitespace() {
                j += 1;
            }
            if matches!(chars.get(j), Some('}') | Some(']')) {
                i += 1;
                continue;
            }
        }
        out.push(c);
        i += 1;
        depth = track_depth(depth, c);
    }

    out
}

/// Quotes identifiers used as object keys, e.g. `{name: ...}` becomes
/// `{"name": ...}`.
pub fn quote_bare_keys(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 16);
    let mut depth = 0usize;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if starts_literal(c, depth) {
            i = copy_string_literal(&chars, i, &mut out);
            continue;
        }
        out.push(c);
        i += 1;
        depth = track_depth(depth, c);
        if (c != '{' && c != ',') || depth == 0 {
            continue;
        }

        let mut j = i;
        while j < chars.len() && chars[j].is_whitespace() {
            j += 1;
        }
        let key_start = j;
        while j < chars.len() && is_identifier_char(chars[j]) {
            j += 1;
        }
        if j == key_start {
            continue;
        }
        let key_end = j;
        while j < chars.len() && chars[j].is_whitespace() {
            j += 1;
        }
        if chars.get(j) != Some(&':') {
            continue;
        }

        out.extend(&chars[i..key_start]);
        out.push('"');
        out.extend(&chars[key_start..key_end]);
        out.push('"');
        i = key_end;
    }

    out
}

/// Removes `//` comments running to the end of the line, outside strings.
pub fn strip_line_comments(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut depth = 0usize;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if starts_literal(c, depth) {
            i = copy_string_literal(&chars, i, &mut out);
            continue;
        }
        if c == '/' && chars.get(i + 1) == Some(&'/') {
            while i < chars.len() && chars[i] != '\n' {
                i += 1;
            }
            continue;
        }
        out.push(c);
        i += 1;
        depth = track_depth(depth, c);
    }

    out
}

pub fn collapse_newlines(text: &str) -> String {
    text.replace("\r\n", " ").replace(['\n', '\r'], " ")
}

/// Returns the text between the first `{` and the last `}`, inclusive.
pub fn extract_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Nesting depth outside string literals; prose around the payload sits at 0.
fn track_depth(depth: usize, c: char) -> usize {
    match c {
        '{' | '[' => depth + 1,
        '}' | ']' => depth.saturating_sub(1),
        _ => depth,
    }
}

fn is_quote(c: char) -> bool {
    c == '"' || c == '\''
}

/// Apostrophes in prose around the payload must not open a literal.
fn starts_literal(c: char, depth: usize) -> bool {
    c == '"' || (c == '\'' && depth > 0)
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$' || c == '-'
}

fn is_json_literal(value: &str) -> bool {
    matches!(value, "true" | "false" | "null")
        || serde_json::from_str::<serde_json::Number>(value).is_ok()
}

fn escape_json_string(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\t' => escaped.push_str("\\t"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Copies the string literal starting at `start` (which must be a quote) to
/// `out`, honouring backslash escapes. Returns the index after the closing
/// quote, or the end of input for an unterminated literal.
fn copy_string_literal(chars: &[char], start: usize, out: &mut String) -> usize {
    let quote = chars[start];
    out.push(quote);
    let mut i = start + 1;
    while i < chars.len() {
        let c = chars[i];
        out.push(c);
        i += 1;
        if c == '\\' {
            if let Some(&escaped) = chars.get(i) {
                out.push(escaped);
                i += 1;
            }
        } else if c == quote {
            break;
        }
    }
    i
}
