//! Core types for InfluxDB query results.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};

use crate::value::Value;

/// One series (measurement + tag set) returned by a statement.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Series {
    /// Measurement name.
    pub name: String,
    /// Tags the series was grouped by.
    pub tags: BTreeMap<String, String>,
    /// Column names, in schema order.
    pub columns: Vec<String>,
    /// Rows, each holding one value per column.
    pub values: Vec<Vec<Value>>,
}

impl Series {
    /// Position of a column in this series' schema.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

/// Result of one statement in a query.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatementResult {
    /// Index of the statement within the query text.
    pub statement_id: usize,
    /// Series returned by the statement.
    pub series: Vec<Series>,
}

/// A parsed query response.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryResult {
    pub(crate) query: String,
    pub(crate) results: Vec<StatementResult>,
}

impl QueryResult {
    /// Create a result from already-parsed statements.
    pub fn new(query: impl Into<String>, results: Vec<StatementResult>) -> Self {
        Self {
            query: query.into(),
            results,
        }
    }

    /// The query text that produced this result.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Per-statement results, in statement order.
    pub fn results(&self) -> &[StatementResult] {
        &self.results
    }

    /// All series across all statements.
    pub fn series(&self) -> impl Iterator<Item = &Series> {
        self.results.iter().flat_map(|r| r.series.iter())
    }

    /// True when no statement returned a row.
    pub fn is_empty(&self) -> bool {
        self.series().all(|s| s.values.is_empty())
    }

    /// Flatten every cell into one sequence of strings.
    ///
    /// Traversal is statement by statement, then series by series, then row
    /// by row in the order the server returned them; within a row, cells
    /// follow the series' column order. Series tags are not included. Nulls
    /// become empty strings.
    pub fn values_as_strings(&self) -> Vec<String> {
        self.series()
            .flat_map(|s| s.values.iter())
            .flat_map(|row| row.iter().map(Value::to_string))
            .collect()
    }

    /// Rows as records keyed by column name.
    pub fn records(&self) -> Vec<Record> {
        let mut records = Vec::new();
        for series in self.series() {
            for row in &series.values {
                let values = series
                    .columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect();
                records.push(Record {
                    series: series.name.clone(),
                    tags: series.tags.clone(),
                    values,
                });
            }
        }
        records
    }
}

/// A single row from a query result.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    /// Name of the series this row belongs to.
    pub series: String,
    /// Tags of that series.
    pub tags: BTreeMap<String, String>,
    /// Column name to value mapping.
    pub values: BTreeMap<String, Value>,
}

impl Record {
    /// Get a value by column name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Get value as string.
    pub fn get_string(&self, name: &str) -> Option<String> {
        self.values.get(name).and_then(|v| v.string())
    }

    /// Get value as f64.
    pub fn get_double(&self, name: &str) -> Option<f64> {
        self.values.get(name).and_then(|v| v.as_double())
    }

    /// Get value as i64.
    pub fn get_long(&self, name: &str) -> Option<i64> {
        self.values.get(name).and_then(|v| v.as_long())
    }

    /// Get value as bool.
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.values.get(name).and_then(|v| v.as_bool())
    }

    /// Get a tag of the row's series.
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags.get(name).map(String::as_str)
    }

    /// Parse the `time` column as an RFC3339 timestamp.
    pub fn time(&self) -> Option<DateTime<FixedOffset>> {
        self.values
            .get("time")
            .and_then(|v| v.as_string())
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
    }
}
