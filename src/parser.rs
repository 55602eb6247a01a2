//! Parser for InfluxDB 1.x JSON query responses.
//!
//! The `/query` endpoint answers with
//!
//! ```text
//! {"results":[{"statement_id":0,"series":[{"name":"cpu","tags":{..},"columns":[..],"values":[[..],..]}]}]}
//! ```
//!
//! and reports failures either at the top level (`{"error": ".."}`) or per
//! statement (`{"results":[{"statement_id":0,"error":".."}]}`).

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::de::Error as _;

use crate::error::{Error, Result};
use crate::types::{QueryResult, Series, StatementResult};
use crate::value::Value;

#[derive(Debug, Deserialize)]
struct RawResponse {
    #[serde(default)]
    results: Option<Vec<RawStatement>>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawStatement {
    #[serde(default)]
    statement_id: usize,
    #[serde(default)]
    series: Option<Vec<RawSeries>>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSeries {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    tags: Option<BTreeMap<String, String>>,
    #[serde(default)]
    columns: Option<Vec<String>>,
    #[serde(default)]
    values: Option<Vec<Vec<serde_json::Value>>>,
}

/// Parse a query response body produced by `query`.
///
/// A server-reported error anywhere in the response becomes
/// [`Error::Database`]; a body that is not valid response JSON becomes
/// [`Error::Serialization`].
pub fn parse_response(query: &str, body: &str) -> Result<QueryResult> {
    let raw: RawResponse = serde_json::from_str(body)?;

    if let Some(message) = raw.error {
        return Err(Error::Database { message });
    }

    let mut results = Vec::new();
    for statement in raw.results.unwrap_or_default() {
        if let Some(message) = statement.error {
            return Err(Error::Database { message });
        }

        let mut series = Vec::new();
        for s in statement.series.unwrap_or_default() {
            series.push(convert_series(s)?);
        }
        results.push(StatementResult {
            statement_id: statement.statement_id,
            series,
        });
    }

    Ok(QueryResult::new(query, results))
}

fn convert_series(raw: RawSeries) -> Result<Series> {
    let name = raw.name.unwrap_or_default();
    let columns = raw.columns.unwrap_or_default();
    let mut values = Vec::new();

    for row in raw.values.unwrap_or_default() {
        if row.len() != columns.len() {
            return Err(Error::Serialization(serde_json::Error::custom(format!(
                "series '{}': row has {} values but {} columns",
                name,
                row.len(),
                columns.len()
            ))));
        }
        values.push(row.iter().map(Value::from).collect());
    }

    Ok(Series {
        name,
        tags: raw.tags.unwrap_or_default(),
        columns,
        values,
    })
}

/// Extract the `error` message from an error response body, if it is one.
pub fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<RawResponse>(body)
        .ok()
        .and_then(|r| r.error)
}
