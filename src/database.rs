//! Database-level operations.

use crate::client::Client;
use crate::driver::{Outcome, Request};
use crate::error::{Error, Result};
use crate::line_protocol;
use crate::parser;
use crate::point::Point;
use crate::query::{QueryBuilder, quote_identifier};
use crate::types::QueryResult;
use crate::uri;

/// A named database on the server a [`Client`] points at.
///
/// Obtained from [`Client::select_db`] or [`Database::from_uri`]. Every
/// operation goes through the client's driver at the time of the call, so
/// rebinding the client's driver affects existing `Database` values too.
#[derive(Clone, Debug)]
pub struct Database {
    client: Client,
    name: String,
}

impl Database {
    pub(crate) fn new(client: Client, name: impl Into<String>) -> Self {
        Self {
            client,
            name: name.into(),
        }
    }

    /// Create a client from `uri` and select the database named by its path.
    ///
    /// Fails with [`Error::InvalidUri`] when the URI has no database path.
    pub fn from_uri(uri: &str) -> Result<Self> {
        let config = uri::resolve(uri)?;
        let name = config.database.clone().ok_or_else(|| Error::InvalidUri {
            uri: uri.to_string(),
            reason: "missing database name in path".to_string(),
        })?;
        Ok(Client::from_config(config).select_db(name))
    }

    /// Get the database name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the client this database is bound to.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Create the database on the server (`CREATE DATABASE`).
    ///
    /// Creating a database that already exists succeeds.
    pub async fn create(&self) -> Result<()> {
        tracing::debug!("creating database {}", self.name);
        let command = format!("CREATE DATABASE {}", quote_identifier(&self.name));
        self.client.command(None, &command).await?;
        Ok(())
    }

    /// Drop the database and all its data (`DROP DATABASE`).
    pub async fn drop_database(&self) -> Result<()> {
        tracing::debug!("dropping database {}", self.name);
        let command = format!("DROP DATABASE {}", quote_identifier(&self.name));
        self.client.command(None, &command).await?;
        Ok(())
    }

    /// Check whether the database exists on the server.
    pub async fn exists(&self) -> Result<bool> {
        let databases = self.client.list_databases().await?;
        Ok(databases.iter().any(|d| d == &self.name))
    }

    /// Write a single point.
    pub async fn write_point(&self, point: &Point) -> Result<()> {
        self.write_points(std::slice::from_ref(point)).await
    }

    /// Write a batch of points as one payload.
    ///
    /// The whole batch is handed to the driver in a single send; there is no
    /// per-point confirmation. An empty batch sends nothing.
    pub async fn write_points(&self, points: &[Point]) -> Result<()> {
        if points.is_empty() {
            tracing::debug!("no points to write to {}", self.name);
            return Ok(());
        }
        let payload = line_protocol::encode_points(points);
        tracing::debug!("writing {} points to {}", points.len(), self.name);
        self.write_payload(&payload).await
    }

    /// Write pre-encoded line protocol.
    pub async fn write_payload(&self, payload: &str) -> Result<()> {
        if payload.is_empty() {
            return Ok(());
        }
        tracing::trace!("line protocol payload:\n{}", payload);
        match self.client.send(Request::write(&self.name, payload)).await? {
            Outcome::Ack => Ok(()),
            Outcome::Response(body) if body.trim().is_empty() => Ok(()),
            // Some proxies answer 200 with an error document.
            Outcome::Response(body) => match parser::error_message(&body) {
                Some(message) => Err(Error::Database { message }),
                None => Ok(()),
            },
        }
    }

    /// Execute a raw query against this database.
    pub async fn query(&self, query: &str) -> Result<QueryResult> {
        self.client.query(Some(&self.name), query).await
    }

    /// Start a query builder bound to this database.
    pub fn query_builder(&self) -> QueryBuilder {
        QueryBuilder::for_database(self.clone())
    }
}
