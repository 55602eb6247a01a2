//! Transports that carry encoded requests to an InfluxDB server.
//!
//! A [`Client`](crate::Client) holds exactly one [`Driver`] at a time. Two are
//! provided: [`HttpDriver`] talks to the HTTP API and returns the response
//! body, [`UdpDriver`] fires line protocol at the UDP listener and never hears
//! back.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use tokio::net::UdpSocket;

use crate::error::{Error, Result};
use crate::parser;
use crate::uri::ConnectionConfig;

/// Largest payload that fits in a single IPv4 UDP datagram.
pub const MAX_DATAGRAM_SIZE: usize = 65_507;

/// What a request asks the server to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endpoint {
    /// Read-only query (`GET /query`).
    Query,
    /// Schema-changing statement such as `CREATE DATABASE` (`POST /query`).
    Command,
    /// Line protocol write (`POST /write`).
    Write,
}

/// A request handed to a driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Request<'a> {
    /// Target endpoint.
    pub endpoint: Endpoint,
    /// Database the request applies to, if any.
    pub database: Option<&'a str>,
    /// Query text or line protocol payload.
    pub body: &'a str,
}

impl<'a> Request<'a> {
    /// A read-only query.
    pub fn query(database: Option<&'a str>, query: &'a str) -> Self {
        Self {
            endpoint: Endpoint::Query,
            database,
            body: query,
        }
    }

    /// A schema-changing statement.
    pub fn command(database: Option<&'a str>, command: &'a str) -> Self {
        Self {
            endpoint: Endpoint::Command,
            database,
            body: command,
        }
    }

    /// A line protocol write.
    pub fn write(database: &'a str, payload: &'a str) -> Self {
        Self {
            endpoint: Endpoint::Write,
            database: Some(database),
            body: payload,
        }
    }
}

/// Result of a successful send.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The server answered with this body.
    Response(String),
    /// The payload was handed to the transport; no answer will come.
    Ack,
}

impl Outcome {
    /// The response body, if there was one.
    pub fn into_body(self) -> Option<String> {
        match self {
            Outcome::Response(body) => Some(body),
            Outcome::Ack => None,
        }
    }
}

/// A transport capable of delivering requests to the server.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Deliver `request` and report what came back.
    async fn send(&self, request: Request<'_>) -> Result<Outcome>;
}

/// Driver for the InfluxDB 1.x HTTP API.
#[derive(Clone, Debug)]
pub struct HttpDriver {
    http: reqwest::Client,
    base_url: String,
    username: Option<String>,
    password: Option<String>,
    timeout: Option<Duration>,
}

impl HttpDriver {
    /// Create a driver for the server described by `config`.
    pub fn new(config: &ConnectionConfig) -> Self {
        Self::with_http_client(reqwest::Client::new(), config)
    }

    /// Create a driver with a custom reqwest client.
    ///
    /// This allows you to configure proxies, TLS settings, connection pools, etc.
    pub fn with_http_client(http: reqwest::Client, config: &ConnectionConfig) -> Self {
        Self {
            http,
            base_url: config.base_url(),
            username: config.username.clone(),
            password: config.password.clone(),
            timeout: config.timeout,
        }
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the full URL for an API endpoint.
    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl Driver for HttpDriver {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn send(&self, request: Request<'_>) -> Result<Outcome> {
        tracing::debug!(
            endpoint = ?request.endpoint,
            database = request.database,
            bytes = request.body.len(),
            "sending HTTP request to {}",
            self.base_url
        );

        let mut params: Vec<(&str, &str)> = Vec::with_capacity(2);
        if let Some(db) = request.database {
            params.push(("db", db));
        }

        let mut builder = match request.endpoint {
            Endpoint::Query => {
                params.push(("q", request.body));
                self.http.get(self.endpoint("/query")).query(&params)
            }
            Endpoint::Command => {
                params.push(("q", request.body));
                self.http.post(self.endpoint("/query")).query(&params)
            }
            Endpoint::Write => {
                params.push(("precision", "n"));
                self.http
                    .post(self.endpoint("/write"))
                    .query(&params)
                    .header(CONTENT_TYPE, "text/plain; charset=utf-8")
                    .body(request.body.to_string())
            }
        };

        if let Some(username) = &self.username {
            builder = builder.basic_auth(username, self.password.as_ref());
        }
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            tracing::trace!(status = status.as_u16(), "response body: {}", body);
            return Ok(Outcome::Response(body));
        }

        match parser::error_message(&body) {
            Some(message) => Err(Error::Database { message }),
            None => Err(Error::UnexpectedStatus {
                status: status.as_u16(),
                body,
            }),
        }
    }
}

/// Driver for the InfluxDB UDP listener.
///
/// Writes only. The database is chosen by the listener's own configuration,
/// so the request's database name is not transmitted. Delivery is never
/// confirmed: a send reports [`Outcome::Ack`] once the datagram has been
/// offered to the socket, even if it was dropped on the way. A host that does
/// not resolve or a socket that cannot be bound is logged and acknowledged
/// the same way.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UdpDriver {
    host: String,
    port: u16,
}

impl UdpDriver {
    /// Create a driver targeting `host:port`.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Target host.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Target port.
    pub fn port(&self) -> u16 {
        self.port
    }
}

#[async_trait]
impl Driver for UdpDriver {
    fn name(&self) -> &'static str {
        "udp"
    }

    async fn send(&self, request: Request<'_>) -> Result<Outcome> {
        if request.endpoint != Endpoint::Write {
            return Err(Error::Unsupported(format!(
                "{:?} requests need a response; the UDP driver only carries writes",
                request.endpoint
            )));
        }

        let host = self.host.trim_start_matches('[').trim_end_matches(']');
        let target = match tokio::net::lookup_host((host, self.port)).await {
            Ok(mut addrs) => addrs.next(),
            Err(e) => {
                tracing::warn!("UDP target {}:{} did not resolve: {}", self.host, self.port, e);
                return Ok(Outcome::Ack);
            }
        };
        let Some(target) = target else {
            tracing::warn!("no address found for UDP target {}:{}", self.host, self.port);
            return Ok(Outcome::Ack);
        };

        let local = if target.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let socket = match UdpSocket::bind(local).await {
            Ok(socket) => socket,
            Err(e) => {
                tracing::warn!("could not bind a UDP socket on {}: {}", local, e);
                return Ok(Outcome::Ack);
            }
        };

        let payload = request.body.as_bytes();
        if payload.len() > MAX_DATAGRAM_SIZE {
            tracing::warn!(
                "UDP payload of {} bytes exceeds the {} byte datagram limit",
                payload.len(),
                MAX_DATAGRAM_SIZE
            );
        }

        match socket.send_to(payload, target).await {
            Ok(sent) => tracing::debug!(
                database = request.database,
                "sent {} byte datagram to {}",
                sent,
                target
            ),
            Err(e) => tracing::warn!("UDP datagram to {} was not sent: {}", target, e),
        }

        Ok(Outcome::Ack)
    }
}
