//! Error types for influxdb-inflow.

use thiserror::Error;

/// Error type for influxdb-inflow operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Connection URI could not be resolved.
    #[error("Invalid connection URI '{uri}': {reason}")]
    InvalidUri {
        /// The URI as given by the caller.
        uri: String,
        /// What was wrong with it.
        reason: String,
    },

    /// Point failed validation in `build()`.
    #[error("Invalid point: {0}")]
    InvalidPoint(String),

    /// Query builder was composed without its mandatory clauses.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// HTTP request failed (connection refused, timeout, body read).
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Server answered with a non-success status and no error message.
    #[error("Unexpected HTTP status {status}: {body}")]
    UnexpectedStatus {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// Response body was not valid JSON of the expected shape.
    #[error("Failed to parse response: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The server rejected the command or query.
    #[error("Database error: {message}")]
    Database {
        /// Error message returned by InfluxDB.
        message: String,
    },

    /// Failed to decode line protocol.
    #[error("Failed to parse line protocol: {message}")]
    Parse {
        /// Description of what failed to parse.
        message: String,
    },

    /// The active driver cannot carry this kind of request.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

impl Error {
    /// Returns true for network-level failures: the request never produced a
    /// usable answer from the server.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::Transport(_) | Error::UnexpectedStatus { .. } | Error::Serialization(_)
        )
    }

    pub(crate) fn parse(message: impl Into<String>) -> Self {
        Error::Parse {
            message: message.into(),
        }
    }
}

/// Result type alias for influxdb-inflow operations.
pub type Result<T> = std::result::Result<T, Error>;
