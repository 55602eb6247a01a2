//! Points: the unit of data written to InfluxDB.
//!
//! A [`Point`] is assembled through a [`PointBuilder`] and validated once by
//! [`PointBuilder::build`]. After that it is immutable and can be rendered as
//! a line of line protocol with [`Point::to_line`] or `Display`.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::line_protocol;

/// Unit of a timestamp handed to [`PointBuilder::time`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Precision {
    /// Seconds since the Unix epoch.
    Seconds,
    /// Milliseconds since the Unix epoch.
    Milliseconds,
    /// Microseconds since the Unix epoch.
    Microseconds,
    /// Nanoseconds since the Unix epoch.
    #[default]
    Nanoseconds,
}

impl Precision {
    /// Number of nanoseconds in one unit of this precision.
    pub fn nanos_per_unit(self) -> i64 {
        match self {
            Precision::Seconds => 1_000_000_000,
            Precision::Milliseconds => 1_000_000,
            Precision::Microseconds => 1_000,
            Precision::Nanoseconds => 1,
        }
    }

    /// Convert `value` in this unit to nanoseconds, or `None` on overflow.
    pub fn to_nanos(self, value: i64) -> Option<i64> {
        value.checked_mul(self.nanos_per_unit())
    }
}

/// A timestamp as supplied by the caller: an epoch value and its unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timestamp {
    /// Epoch value, counted in `precision` units.
    pub value: i64,
    /// Unit of `value`.
    pub precision: Precision,
}

impl Timestamp {
    /// The timestamp in nanoseconds since the epoch. Points validate this at
    /// build time, so for a built point it is always `Some`.
    pub fn nanos(&self) -> Option<i64> {
        self.precision.to_nanos(self.value)
    }
}

/// A typed field value.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    /// 64-bit float, written without a suffix.
    Float(f64),
    /// Signed 64-bit integer, written with an `i` suffix.
    Integer(i64),
    /// Boolean, written as `true`/`false`.
    Boolean(bool),
    /// String, written double-quoted.
    String(String),
}

impl FieldValue {
    /// Returns the value as a f64 if it is a `Float` variant.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            FieldValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns the value as an i64 if it is an `Integer` variant.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the value as a bool if it is a `Boolean` variant.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the value as a string reference if it is a `String` variant.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }
}

macro_rules! field_from {
    ($variant:ident: $($t:ty),+) => {
        $(
            impl From<$t> for FieldValue {
                fn from(v: $t) -> Self {
                    FieldValue::$variant(v.into())
                }
            }
        )+
    };
}

field_from!(Float: f64, f32);
field_from!(Integer: i64, i32, i16, i8, u32, u16, u8);
field_from!(Boolean: bool);
field_from!(String: String, &str);

/// A validated, immutable data point.
#[derive(Clone, Debug, PartialEq)]
pub struct Point {
    measurement: String,
    tags: BTreeMap<String, String>,
    fields: IndexMap<String, FieldValue>,
    timestamp: Option<Timestamp>,
}

impl Point {
    /// Start building a point for `measurement`.
    ///
    /// # Example
    ///
    /// ```
    /// use influxdb_inflow::{Point, Precision};
    ///
    /// let point = Point::builder("cpu_load_short")
    ///     .field("value", 0.64)
    ///     .tag("host", "server01")
    ///     .tag("region", "us-west")
    ///     .field("cpucount", 10)
    ///     .time(1452129125, Precision::Seconds)
    ///     .build()
    ///     .unwrap();
    ///
    /// assert_eq!(
    ///     point.to_line(),
    ///     "cpu_load_short,host=server01,region=us-west value=0.64,cpucount=10i 1452129125000000000"
    /// );
    /// ```
    pub fn builder(measurement: impl Into<String>) -> PointBuilder {
        PointBuilder::new(measurement)
    }

    /// Measurement name.
    pub fn measurement(&self) -> &str {
        &self.measurement
    }

    /// Tags, sorted by key.
    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    /// Fields, in the order they were first supplied.
    pub fn fields(&self) -> &IndexMap<String, FieldValue> {
        &self.fields
    }

    /// Get a field value by key.
    pub fn field(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// Get a tag value by key.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Timestamp as supplied to the builder.
    pub fn timestamp(&self) -> Option<Timestamp> {
        self.timestamp
    }

    /// Timestamp in nanoseconds since the epoch.
    pub fn timestamp_nanos(&self) -> Option<i64> {
        self.timestamp.and_then(|t| t.nanos())
    }

    /// Encode this point as one line of line protocol (no trailing newline).
    pub fn to_line(&self) -> String {
        line_protocol::encode_point(self)
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_line())
    }
}

impl FromStr for Point {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self> {
        line_protocol::parse_line(line)
    }
}

/// Staged builder for [`Point`].
///
/// Every call consumes and returns the builder. Repeating `tag`, `field` or
/// `time` overwrites the earlier value; a repeated field keeps its original
/// position.
#[derive(Clone, Debug)]
pub struct PointBuilder {
    measurement: String,
    tags: BTreeMap<String, String>,
    fields: IndexMap<String, FieldValue>,
    timestamp: Option<Timestamp>,
}

impl PointBuilder {
    /// Create a builder for `measurement`.
    pub fn new(measurement: impl Into<String>) -> Self {
        Self {
            measurement: measurement.into(),
            tags: BTreeMap::new(),
            fields: IndexMap::new(),
            timestamp: None,
        }
    }

    /// Set a tag.
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Set a field.
    pub fn field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Set the timestamp as an epoch value in the given unit.
    pub fn time(mut self, value: i64, precision: Precision) -> Self {
        self.timestamp = Some(Timestamp { value, precision });
        self
    }

    /// Set the timestamp from a UTC instant, at nanosecond precision.
    ///
    /// Instants outside the range representable in i64 nanoseconds (roughly
    /// years 1677 to 2262) make `build()` fail.
    pub fn time_from(mut self, instant: DateTime<Utc>) -> Self {
        self.timestamp = Some(match instant.timestamp_nanos_opt() {
            Some(nanos) => Timestamp {
                value: nanos,
                precision: Precision::Nanoseconds,
            },
            // Seconds never overflow here; build() reports the nanosecond overflow.
            None => Timestamp {
                value: instant.timestamp(),
                precision: Precision::Seconds,
            },
        });
        self
    }

    /// Validate and freeze the point.
    pub fn build(self) -> Result<Point> {
        if self.measurement.is_empty() {
            return Err(Error::InvalidPoint("measurement must not be empty".to_string()));
        }
        if self.fields.is_empty() {
            return Err(Error::InvalidPoint(format!(
                "point '{}' has no fields",
                self.measurement
            )));
        }
        if self.measurement.starts_with('#') {
            return Err(Error::InvalidPoint(format!(
                "measurement {:?} starts with '#' and would be read as a comment",
                self.measurement
            )));
        }
        check_text("measurement", &self.measurement)?;
        check_backslashes(
            "measurement",
            &self.measurement,
            line_protocol::MEASUREMENT_SPECIALS,
        )?;

        for (key, value) in &self.tags {
            if key.is_empty() {
                return Err(Error::InvalidPoint("tag key must not be empty".to_string()));
            }
            if value.is_empty() {
                return Err(Error::InvalidPoint(format!("tag '{}' has an empty value", key)));
            }
            check_text("tag key", key)?;
            check_text("tag value", value)?;
            check_backslashes("tag key", key, line_protocol::KEY_SPECIALS)?;
            check_backslashes("tag value", value, line_protocol::KEY_SPECIALS)?;
        }

        for (key, value) in &self.fields {
            if key.is_empty() {
                return Err(Error::InvalidPoint("field key must not be empty".to_string()));
            }
            check_text("field key", key)?;
            check_backslashes("field key", key, line_protocol::KEY_SPECIALS)?;
            match value {
                FieldValue::Float(f) if !f.is_finite() => {
                    return Err(Error::InvalidPoint(format!(
                        "field '{}' is not a finite number: {}",
                        key, f
                    )));
                }
                FieldValue::String(s) => check_text("field value", s)?,
                _ => {}
            }
        }

        if let Some(ts) = self.timestamp {
            if ts.nanos().is_none() {
                return Err(Error::InvalidPoint(format!(
                    "timestamp {} {:?} overflows nanosecond precision",
                    ts.value, ts.precision
                )));
            }
        }

        Ok(Point {
            measurement: self.measurement,
            tags: self.tags,
            fields: self.fields,
            timestamp: self.timestamp,
        })
    }
}

/// Line protocol has no escape for line breaks.
fn check_text(what: &str, s: &str) -> Result<()> {
    if s.contains(['\n', '\r']) {
        return Err(Error::InvalidPoint(format!(
            "{} {:?} contains a line break",
            what, s
        )));
    }
    Ok(())
}

/// A backslash is written as-is, so one that ends a name or precedes a
/// character the encoder escapes would merge with that escape.
fn check_backslashes(what: &str, s: &str, specials: &[char]) -> Result<()> {
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            continue;
        }
        match chars.peek() {
            None => {
                return Err(Error::InvalidPoint(format!(
                    "{} {:?} ends with a backslash",
                    what, s
                )));
            }
            Some(next) if specials.contains(next) => {
                return Err(Error::InvalidPoint(format!(
                    "{} {:?} has a backslash before {:?}",
                    what, s, next
                )));
            }
            _ => {}
        }
    }
    Ok(())
}
