//! Line-oriented `key=value` text in the properties dialect the locator file uses
//!
//! Supported syntax:
//! - `#` and `!` comment lines, blank lines
//! - `=`, `:` or whitespace as the key/value separator
//! - backslash escapes (`\\`, `\t`, `\n`, `\r`, `\f`, `\uXXXX`, escaped separators)
//! - a trailing unescaped backslash joins the next line

use crate::error::{TestKitError, TestKitResult};
use std::collections::BTreeMap;

/// Parsed key/value pairs. Later duplicates override earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: BTreeMap<String, String>,
}

impl Properties {
    /// Parse properties text
    pub fn parse(text: &str) -> TestKitResult<Self> {
        let mut entries = BTreeMap::new();

        for (line_number, logical) in logical_lines(text) {
            let (raw_key, raw_value) = split_entry(&logical);
            let key = unescape(raw_key).map_err(|e| {
                TestKitError::configuration(format!("line {}: {}", line_number, e))
            })?;
            let value = unescape(raw_value).map_err(|e| {
                TestKitError::configuration(format!("line {}: {}", line_number, e))
            })?;
            entries.insert(key, value);
        }

        Ok(Self { entries })
    }

    /// Look up a value by key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\x0c')
}

/// Join continuation lines and drop comments and blanks.
/// Yields the 1-based physical line number each logical line starts on.
fn logical_lines(text: &str) -> Vec<(usize, String)> {
    let mut result = Vec::new();
    let mut current: Option<(usize, String)> = None;

    for (index, physical) in text.lines().enumerate() {
        let physical = physical.strip_suffix('\r').unwrap_or(physical);
        let trimmed = physical.trim_start_matches(is_blank);

        if current.is_none() && (trimmed.is_empty() || trimmed.starts_with(['#', '!'])) {
            continue;
        }

        let trailing = trimmed.chars().rev().take_while(|c| *c == '\\').count();
        let continues = trailing % 2 == 1;
        let content = if continues {
            &trimmed[..trimmed.len() - 1]
        } else {
            trimmed
        };

        let (_, buffer) = current.get_or_insert_with(|| (index + 1, String::new()));
        buffer.push_str(content);

        if !continues {
            if let Some(done) = current.take() {
                result.push(done);
            }
        }
    }

    // A continuation on the last line still ends the entry
    if let Some(done) = current.take() {
        result.push(done);
    }

    result
}

/// Split a logical line into raw (still escaped) key and value
fn split_entry(line: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut key_end = line.len();

    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => {
                key_end = i;
                break;
            }
            c if is_blank(c) => {
                key_end = i;
                break;
            }
            _ => {}
        }
    }

    let key = &line[..key_end];
    let mut rest = line[key_end..].trim_start_matches(is_blank);
    if let Some(stripped) = rest.strip_prefix(['=', ':']) {
        rest = stripped.trim_start_matches(is_blank);
    }
    (key, rest)
}

fn unescape(raw: &str) -> Result<String, String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\x0c'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                let code = (hex.len() == 4 && hex.chars().all(|c| c.is_ascii_hexdigit()))
                    .then(|| u32::from_str_radix(&hex, 16).ok())
                    .flatten()
                    .and_then(char::from_u32)
                    .ok_or_else(|| format!("malformed \\uxxxx encoding '\\u{}'", hex))?;
                out.push(code);
            }
            Some(other) => out.push(other),
            None => {}
        }
    }

    Ok(out)
}

/// Escape a value so that [`Properties::parse`] reads it back unchanged
pub fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for (i, c) in value.chars().enumerate() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\x0c' => out.push_str("\\f"),
            ' ' if i == 0 => out.push_str("\\ "),
            c => out.push(c),
        }
    }
    out
}
