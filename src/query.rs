//! Fluent construction of InfluxQL `SELECT` statements.

use crate::database::Database;
use crate::error::{Error, Result};
use crate::types::QueryResult;

/// Builder for a `SELECT` query.
///
/// Each call consumes the builder and returns the updated one. Clauses are
/// composed in a fixed order regardless of call order:
///
/// ```text
/// SELECT <columns> FROM <measurement> [WHERE ..] [GROUP BY ..] [ORDER BY ..] [LIMIT n] [OFFSET n]
/// ```
///
/// `select` and `from` are mandatory. Conditions are passed through verbatim,
/// so string literals inside them must be single-quoted by the caller
/// (`region = 'us-west'`); a double-quoted literal is read by InfluxDB as an
/// identifier and silently matches nothing.
///
/// # Example
///
/// ```
/// use influxdb_inflow::QueryBuilder;
///
/// let query = QueryBuilder::new()
///     .select("cpucount")
///     .from("test_metric")
///     .where_clause("region = 'us-west'")
///     .query_command()
///     .unwrap();
/// assert_eq!(query, "SELECT cpucount FROM test_metric WHERE region = 'us-west'");
/// ```
#[derive(Clone, Debug, Default)]
pub struct QueryBuilder {
    database: Option<Database>,
    columns: Vec<String>,
    from: Option<String>,
    from_repeated: bool,
    conditions: Vec<String>,
    group_by: Vec<String>,
    order_by: Option<String>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl QueryBuilder {
    /// Create an unbound builder. It can compose query text but not execute it.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn for_database(database: Database) -> Self {
        Self {
            database: Some(database),
            ..Self::default()
        }
    }

    /// Add columns or expressions to select, e.g. `"value"` or `"mean(value)"`.
    /// Repeated calls append.
    pub fn select(mut self, columns: impl Into<String>) -> Self {
        let columns = columns.into();
        let columns = columns.trim();
        if !columns.is_empty() {
            self.columns.push(columns.to_string());
        }
        self
    }

    /// Set the measurement to select from. May be called only once.
    pub fn from(mut self, measurement: impl Into<String>) -> Self {
        if self.from.is_some() {
            self.from_repeated = true;
        }
        self.from = Some(measurement.into());
        self
    }

    /// Add a condition. Repeated calls are combined with `AND`.
    pub fn where_clause(mut self, condition: impl Into<String>) -> Self {
        self.conditions.push(condition.into());
        self
    }

    /// Add a `GROUP BY` dimension such as a tag key or `time(10m)`.
    pub fn group_by(mut self, dimension: impl Into<String>) -> Self {
        self.group_by.push(dimension.into());
        self
    }

    /// Set the `ORDER BY` clause, e.g. `"time DESC"`.
    pub fn order_by(mut self, order: impl Into<String>) -> Self {
        self.order_by = Some(order.into());
        self
    }

    /// Limit the number of returned points.
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skip the first `offset` points.
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Compose the query text without executing it.
    pub fn query_command(&self) -> Result<String> {
        if self.columns.is_empty() {
            return Err(Error::InvalidQuery("SELECT clause is required".to_string()));
        }
        if self.from_repeated {
            return Err(Error::InvalidQuery("FROM was specified more than once".to_string()));
        }
        let from = match self.from.as_deref().map(str::trim) {
            Some(m) if !m.is_empty() => m,
            _ => return Err(Error::InvalidQuery("FROM clause is required".to_string())),
        };

        let mut query = format!("SELECT {} FROM {}", self.columns.join(","), from);

        if !self.conditions.is_empty() {
            query.push_str(" WHERE ");
            query.push_str(&self.conditions.join(" AND "));
        }
        if !self.group_by.is_empty() {
            query.push_str(" GROUP BY ");
            query.push_str(&self.group_by.join(","));
        }
        if let Some(order) = &self.order_by {
            query.push_str(" ORDER BY ");
            query.push_str(order);
        }
        if let Some(limit) = self.limit {
            query.push_str(&format!(" LIMIT {}", limit));
        }
        if let Some(offset) = self.offset {
            query.push_str(&format!(" OFFSET {}", offset));
        }

        Ok(query)
    }

    /// Compose the query and execute it against the bound database.
    pub async fn query_result(&self) -> Result<QueryResult> {
        let query = self.query_command()?;
        let database = self.database.as_ref().ok_or_else(|| {
            Error::InvalidQuery("query builder is not bound to a database".to_string())
        })?;
        database.query(&query).await
    }
}

/// Double-quote an InfluxQL identifier such as a database name.
pub fn quote_identifier(name: &str) -> String {
    let mut quoted = String::with_capacity(name.len() + 2);
    quoted.push('"');
    for c in name.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}
