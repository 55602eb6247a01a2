//! Line protocol encoding and decoding.
//!
//! ```text
//! measurement[,tag_key=tag_val]* field_key=field_val[,field_key=field_val]* [timestamp]
//! ```
//!
//! Measurements escape commas and spaces; tag keys, tag values and field keys
//! also escape equals signs. String field values are double-quoted with inner
//! quotes and backslashes escaped. Integers carry an `i` suffix, floats are
//! written in plain decimal form and timestamps are nanoseconds.

use std::fmt::Write;

use crate::error::{Error, Result};
use crate::point::{FieldValue, Point, PointBuilder, Precision};

pub(crate) const MEASUREMENT_SPECIALS: &[char] = &[',', ' '];
pub(crate) const KEY_SPECIALS: &[char] = &[',', '=', ' '];

/// Encode one point as a line (no trailing newline).
pub fn encode_point(point: &Point) -> String {
    let mut line = String::with_capacity(64);
    write_point(point, &mut line);
    line
}

/// Encode a batch of points, one per line, separated by `\n`.
pub fn encode_points<'a, I>(points: I) -> String
where
    I: IntoIterator<Item = &'a Point>,
{
    let mut out = String::new();
    for (i, point) in points.into_iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        write_point(point, &mut out);
    }
    out
}

/// Append the encoded form of `point` to `out`.
pub fn write_point(point: &Point, out: &mut String) {
    escape_into(point.measurement(), MEASUREMENT_SPECIALS, out);

    for (key, value) in point.tags() {
        out.push(',');
        escape_into(key, KEY_SPECIALS, out);
        out.push('=');
        escape_into(value, KEY_SPECIALS, out);
    }

    out.push(' ');
    for (i, (key, value)) in point.fields().iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        escape_into(key, KEY_SPECIALS, out);
        out.push('=');
        write_field_value(value, out);
    }

    if let Some(nanos) = point.timestamp_nanos() {
        // Writing to a String cannot fail.
        let _ = write!(out, " {}", nanos);
    }
}

fn write_field_value(value: &FieldValue, out: &mut String) {
    match value {
        FieldValue::Float(f) => {
            let _ = write!(out, "{}", f);
        }
        FieldValue::Integer(i) => {
            let _ = write!(out, "{}i", i);
        }
        FieldValue::Boolean(b) => out.push_str(if *b { "true" } else { "false" }),
        FieldValue::String(s) => {
            out.push('"');
            for c in s.chars() {
                if c == '"' || c == '\\' {
                    out.push('\\');
                }
                out.push(c);
            }
            out.push('"');
        }
    }
}

fn escape_into(s: &str, specials: &[char], out: &mut String) {
    for c in s.chars() {
        if specials.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
}

/// Escape a tag key, tag value or field key.
pub fn escape_key(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    escape_into(s, KEY_SPECIALS, &mut out);
    out
}

/// Escape a measurement name.
pub fn escape_measurement(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    escape_into(s, MEASUREMENT_SPECIALS, &mut out);
    out
}

/// Decode a single line of line protocol into a [`Point`].
///
/// Decoded timestamps are taken to be nanoseconds.
pub fn parse_line(line: &str) -> Result<Point> {
    let line = line.trim_end_matches(['\r', '\n']);

    let (series, rest) = split_once_unescaped(line, b' ', false)
        .ok_or_else(|| Error::parse(format!("missing field set in '{}'", line)))?;
    let (fields, timestamp) = match split_once_unescaped(rest, b' ', true) {
        Some((fields, ts)) => (fields, Some(ts.trim())),
        None => (rest, None),
    };

    let mut parts = split_unescaped(series, b',', false).into_iter();
    let measurement = parts.next().unwrap_or_default();
    let mut builder = PointBuilder::new(unescape(measurement, MEASUREMENT_SPECIALS));

    for tag in parts {
        let (key, value) = split_once_unescaped(tag, b'=', false)
            .ok_or_else(|| Error::parse(format!("tag '{}' has no '='", tag)))?;
        builder = builder.tag(unescape(key, KEY_SPECIALS), unescape(value, KEY_SPECIALS));
    }

    if fields.is_empty() {
        return Err(Error::parse(format!("missing field set in '{}'", line)));
    }
    for field in split_unescaped(fields, b',', true) {
        let (key, raw) = split_once_unescaped(field, b'=', false)
            .ok_or_else(|| Error::parse(format!("field '{}' has no '='", field)))?;
        builder = builder.field(unescape(key, KEY_SPECIALS), parse_field_value(raw)?);
    }

    if let Some(ts) = timestamp.filter(|ts| !ts.is_empty()) {
        let nanos = ts
            .parse::<i64>()
            .map_err(|e| Error::parse(format!("invalid timestamp '{}': {}", ts, e)))?;
        builder = builder.time(nanos, Precision::Nanoseconds);
    }

    builder.build().map_err(|e| Error::parse(e.to_string()))
}

/// Decode newline-separated line protocol. Blank lines and `#` comments are
/// skipped.
pub fn parse_lines(text: &str) -> Result<Vec<Point>> {
    text.lines()
        .map(str::trim_start)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(parse_line)
        .collect()
}

fn parse_field_value(raw: &str) -> Result<FieldValue> {
    if let Some(quoted) = raw.strip_prefix('"') {
        let inner = quoted
            .strip_suffix('"')
            .ok_or_else(|| Error::parse(format!("unterminated string value {}", raw)))?;
        return Ok(FieldValue::String(unescape(inner, &['"', '\\'])));
    }

    match raw {
        "t" | "T" | "true" | "True" | "TRUE" => return Ok(FieldValue::Boolean(true)),
        "f" | "F" | "false" | "False" | "FALSE" => return Ok(FieldValue::Boolean(false)),
        _ => {}
    }

    if let Some(int) = raw.strip_suffix('i') {
        return int
            .parse::<i64>()
            .map(FieldValue::Integer)
            .map_err(|e| Error::parse(format!("invalid integer '{}': {}", raw, e)));
    }

    raw.parse::<f64>()
        .map(FieldValue::Float)
        .map_err(|e| Error::parse(format!("invalid field value '{}': {}", raw, e)))
}

/// Byte offset of the first `delim` that is not backslash-escaped and, when
/// `quoted` is set, not inside a double-quoted field value.
fn find_unescaped(s: &str, delim: u8, quoted: bool) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut in_quotes = false;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                i += 2;
                continue;
            }
            b'"' if quoted && (in_quotes || (i > 0 && bytes[i - 1] == b'=')) => {
                in_quotes = !in_quotes;
            }
            b if b == delim && !in_quotes => return Some(i),
            _ => {}
        }
        i += 1;
    }
    None
}

fn split_once_unescaped(s: &str, delim: u8, quoted: bool) -> Option<(&str, &str)> {
    find_unescaped(s, delim, quoted).map(|i| (&s[..i], &s[i + 1..]))
}

fn split_unescaped(s: &str, delim: u8, quoted: bool) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut rest = s;
    while let Some((head, tail)) = split_once_unescaped(rest, delim, quoted) {
        parts.push(head);
        rest = tail;
    }
    parts.push(rest);
    parts
}

fn unescape(s: &str, specials: &[char]) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next) = chars.peek() {
                if specials.contains(&next) {
                    out.push(next);
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}
