//! Escaping of string payloads embedded in line protocol string fields.

use std::borrow::Cow;

const SPECIAL: [char; 4] = ['\\', '"', '\r', '\n'];

/// Escape text for use inside a quoted line protocol string field.
///
/// Backslash and double quote are backslash-escaped; CR and LF become the
/// two-character sequences `\r` and `\n` so a point always stays on one line.
/// Not idempotent: call exactly once per raw value.
pub fn escape(text: &str) -> Cow<'_, str> {
    if !text.chars().any(|c| SPECIAL.contains(&c)) {
        return Cow::Borrowed(text);
    }

    let mut escaped = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\r' => escaped.push_str("\\r"),
            '\n' => escaped.push_str("\\n"),
            other => escaped.push(other),
        }
    }
    Cow::Owned(escaped)
}
