//! InfluxDB v2 Line Protocol encoding.
//!
//! Line Protocol format:
//! ```text
//! measurement,tag1=val1,tag2=val2 field1=val1,field2=val2 timestamp
//! ```
//!
//! See: <https://docs.influxdata.com/influxdb/v2/reference/syntax/line-protocol/>

use crate::point::{FieldValue, Point};

impl FieldValue {
    /// Format this value for InfluxDB Line Protocol.
    ///
    /// - String: wrapped in double quotes. The content is written as-is; the
    ///   point builder has already escaped it.
    /// - Integer: suffixed with `i` (e.g., `42i`)
    /// - Float: written as-is (e.g., `3.14`)
    /// - Boolean: `true` or `false`
    pub fn to_line_protocol(&self) -> String {
        match self {
            FieldValue::String(v) => format!("\"{}\"", v),
            FieldValue::Integer(v) => format!("{}i", v),
            FieldValue::Float(v) => format!("{}", v),
            FieldValue::Boolean(v) => v.to_string(),
        }
    }
}

impl Point {
    /// Encode this point as a single Line Protocol line.
    ///
    /// A point without fields still encodes; the server is left to reject it.
    pub fn to_line_protocol(&self) -> String {
        let mut line = escape_measurement(self.measurement());

        for (key, value) in self.tags() {
            line.push(',');
            line.push_str(&escape_key(key));
            line.push('=');
            line.push_str(&escape_tag_value(value));
        }

        // Space separator before fields
        line.push(' ');

        for (i, (key, value)) in self.fields().iter().enumerate() {
            if i > 0 {
                line.push(',');
            }
            line.push_str(&escape_key(key));
            line.push('=');
            line.push_str(&value.to_line_protocol());
        }

        if let Some(ts) = self.timestamp() {
            line.push(' ');
            line.push_str(&ts.to_string());
        }

        line
    }
}

/// Encode a batch of points, one line each, joined by `\n`.
pub fn encode_batch(points: &[Point]) -> String {
    points
        .iter()
        .map(Point::to_line_protocol)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Escape measurement name per Line Protocol spec.
/// Spaces and commas must be escaped with backslash.
fn escape_measurement(s: &str) -> String {
    s.replace(',', "\\,").replace(' ', "\\ ")
}

/// Escape tag keys and field keys per Line Protocol spec.
fn escape_key(s: &str) -> String {
    escape_tag_value(s)
}

/// Escape a tag value so it stays a single token on a single line.
///
/// Commas, equals signs and spaces get a backslash. CR and LF cannot appear
/// in a tag at all and are written as the two characters `\r` / `\n`. A
/// backslash followed by a separator, another backslash or the end of the
/// value is doubled so it cannot swallow the separator.
pub fn escape_tag_value(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len() + 4);
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            ',' | '=' | ' ' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\\' => {
                escaped.push('\\');
                if matches!(chars.peek(), None | Some(',' | '=' | ' ' | '\\')) {
                    escaped.push('\\');
                }
            }
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::WritePrecision;
    use proptest::prelude::*;

    #[test]
    fn test_field_value_formats() {
        assert_eq!(FieldValue::Float(3.15).to_line_protocol(), "3.15");
        assert_eq!(FieldValue::Integer(42).to_line_protocol(), "42i");
        assert_eq!(
            FieldValue::String("hello world".to_string()).to_line_protocol(),
            "\"hello world\""
        );
        assert_eq!(FieldValue::Boolean(true).to_line_protocol(), "true");
        assert_eq!(FieldValue::Boolean(false).to_line_protocol(), "false");
    }

    #[test]
    fn test_line_protocol_with_tags_in_insertion_order() {
        let point = Point::new("syslog")
            .with_tag("app", "App")
            .with_tag("facility", "App")
            .with_field("message", "started")
            .with_field("version", 1i64)
            .with_timestamp(1_705_327_800_000, WritePrecision::Ms);

        assert_eq!(
            point.to_line_protocol(),
            "syslog,app=App,facility=App message=\"started\",version=1i 1705327800000"
        );
    }

    #[test]
    fn test_line_protocol_escape_special_chars() {
        let point = Point::new("my measurement")
            .with_tag("tag key", "tag,value=x")
            .with_field("field=key", "hello \\\"world\\\"")
            .with_timestamp(3_000, WritePrecision::Ms);

        assert_eq!(
            point.to_line_protocol(),
            "my\\ measurement,tag\\ key=tag\\,value\\=x field\\=key=\"hello \\\"world\\\"\" 3000"
        );
    }

    #[test]
    fn test_tag_value_line_breaks_stay_on_one_line() {
        let point = Point::new("syslog")
            .with_tag("Ctx", "line1\nline2\r")
            .with_field("message", "hi")
            .with_timestamp(1_705_329_000_000, WritePrecision::Ms);

        let line = point.to_line_protocol();
        assert!(!line.contains('\n') && !line.contains('\r'));
        assert_eq!(
            line,
            "syslog,Ctx=line1\\nline2\\r message=\"hi\" 1705329000000"
        );
    }

    #[test]
    fn test_trailing_backslash_does_not_escape_separator() {
        let point = Point::new("syslog")
            .with_tag("Dir", "C:\\")
            .with_tag("Path", "a\\,b")
            .with_field("message", "hi")
            .with_timestamp(1, WritePrecision::Ms);

        assert_eq!(
            point.to_line_protocol(),
            "syslog,Dir=C:\\\\,Path=a\\\\\\,b message=\"hi\" 1"
        );
    }

    #[test]
    fn test_inner_backslash_kept_as_is() {
        assert_eq!(escape_tag_value("C:\\temp"), "C:\\temp");
        assert_eq!(escape_tag_value("a b"), "a\\ b");
        assert_eq!(escape_tag_value("\\\\,"), "\\\\\\\\\\,");
    }

    /// Walks the value the way the server does: a backslash always consumes
    /// the next character, and no bare separator or line break may remain.
    fn is_single_tag_token(text: &str) -> bool {
        let mut chars = text.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => {
                    if chars.next().is_none() {
                        return false;
                    }
                }
                ',' | '=' | ' ' | '\n' | '\r' => return false,
                _ => {}
            }
        }
        true
    }

    proptest! {
        #[test]
        fn tag_value_escape_is_single_token(s in any::<String>()) {
            let escaped = escape_tag_value(&s);
            prop_assert!(is_single_tag_token(&escaped), "{:?} -> {:?}", s, escaped);
        }

        #[test]
        fn tag_value_escape_never_breaks_lines(s in "[a-z\\\\\r\n ,=]{0,16}") {
            let escaped = escape_tag_value(&s);
            prop_assert!(!escaped.contains('\n') && !escaped.contains('\r'));
            prop_assert!(is_single_tag_token(&escaped));
        }
    }

    #[test]
    fn test_point_without_fields_still_encodes() {
        let point = Point::new("syslog")
            .with_tag("app", "App")
            .with_timestamp(1, WritePrecision::Ms);
        assert_eq!(point.to_line_protocol(), "syslog,app=App  1");
    }

    #[test]
    fn test_encode_batch_joins_lines() {
        let points = vec![
            Point::new("m").with_field("f", 1i64).with_timestamp(1, WritePrecision::Ms),
            Point::new("m").with_field("f", 2i64).with_timestamp(2, WritePrecision::Ms),
        ];
        assert_eq!(encode_batch(&points), "m f=1i 1\nm f=2i 2");
        assert_eq!(encode_batch(&[]), "");
    }
}
