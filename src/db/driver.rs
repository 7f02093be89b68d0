//! Database driver abstraction
//!
//! Workers only see [`Driver`] and [`Connection`]; which backend answers is
//! decided once, by URL scheme, in [`UrlDriver`].

use std::future::Future;

use thiserror::Error;

use super::postgres::PostgresConnection;

/// Database driver errors
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Prepare failed: {0}")]
    Prepare(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Query returned no rows")]
    EmptyResult,

    #[error("Close failed: {0}")]
    Close(String),

    #[error("Unsupported connection URL scheme: {0}")]
    UnsupportedScheme(String),
}

/// Rows returned by a query. Only the row count matters for the probe.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RowSet {
    pub rows: usize,
}

impl RowSet {
    pub fn new(rows: usize) -> Self {
        Self { rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }
}

/// Opens connections to a database.
pub trait Driver: Send + Sync + 'static {
    type Conn: Connection;

    /// Open a dedicated connection to `url`
    fn connect(&self, url: &str) -> impl Future<Output = Result<Self::Conn, DbError>> + Send;
}

/// A single connection, owned by exactly one worker.
pub trait Connection: Send + 'static {
    /// Prepare `sql` ahead of the timed loop
    fn prepare(&mut self, sql: &str) -> impl Future<Output = Result<(), DbError>> + Send;

    /// Execute `sql` and return its rows
    fn query(&mut self, sql: &str) -> impl Future<Output = Result<RowSet, DbError>> + Send;

    /// Release the connection and any statement handles it holds
    fn close(self) -> impl Future<Output = Result<(), DbError>> + Send;
}

/// Backend selected from a connection URL
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scheme {
    /// `postgres://` or `postgresql://`
    Postgres,
    /// `jdbc:postgresql://`, served by the Postgres backend
    JdbcPostgres,
}

impl Scheme {
    /// Detect the backend for `url`
    pub fn detect(url: &str) -> Result<Self, DbError> {
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Ok(Scheme::Postgres)
        } else if url.starts_with("jdbc:postgresql://") {
            Ok(Scheme::JdbcPostgres)
        } else {
            let scheme = url.split("://").next().unwrap_or(url);
            Err(DbError::UnsupportedScheme(scheme.to_string()))
        }
    }

    /// Rewrite `url` into the form the backend driver accepts
    pub fn native_url<'a>(&self, url: &'a str) -> &'a str {
        match self {
            Scheme::Postgres => url,
            Scheme::JdbcPostgres => url.strip_prefix("jdbc:").unwrap_or(url),
        }
    }
}

/// Driver that dispatches on the URL scheme
#[derive(Clone, Copy, Debug, Default)]
pub struct UrlDriver;

impl Driver for UrlDriver {
    type Conn = PostgresConnection;

    async fn connect(&self, url: &str) -> Result<Self::Conn, DbError> {
        let scheme = Scheme::detect(url)?;
        match scheme {
            Scheme::Postgres | Scheme::JdbcPostgres => {
                PostgresConnection::connect(scheme.native_url(url)).await
            }
        }
    }
}
