//! Postgres wire protocol backend
//!
//! Built on `tokio-postgres`. The connection future runs on its own task for
//! as long as the client is alive.

use tokio::task::JoinHandle;
use tokio_postgres::{Client, NoTls, Statement};
use tracing::debug;

use super::driver::{Connection, DbError, RowSet};

/// A Postgres client plus the task driving its socket
pub struct PostgresConnection {
    client: Client,
    driver_task: JoinHandle<Result<(), tokio_postgres::Error>>,
    /// Statement prepared during setup, with its SQL text
    prepared: Option<(String, Statement)>,
}

impl PostgresConnection {
    /// Open a connection to `url` (a `postgres://` or `postgresql://` URL)
    pub async fn connect(url: &str) -> Result<Self, DbError> {
        let (client, connection) = tokio_postgres::connect(url, NoTls)
            .await
            .map_err(|e| DbError::Connect(e.to_string()))?;

        let driver_task = tokio::spawn(connection);

        Ok(Self {
            client,
            driver_task,
            prepared: None,
        })
    }

    fn statement(&self, sql: &str) -> Option<&Statement> {
        match &self.prepared {
            Some((text, stmt)) if text == sql => Some(stmt),
            _ => None,
        }
    }
}

impl Connection for PostgresConnection {
    async fn prepare(&mut self, sql: &str) -> Result<(), DbError> {
        if self.statement(sql).is_some() {
            return Ok(());
        }
        let stmt = self
            .client
            .prepare(sql)
            .await
            .map_err(|e| DbError::Prepare(e.to_string()))?;
        debug!("Prepared statement: {sql}");
        self.prepared = Some((sql.to_string(), stmt));
        Ok(())
    }

    async fn query(&mut self, sql: &str) -> Result<RowSet, DbError> {
        // Unprepared text still works, at the cost of an extra round trip
        let rows = match self.statement(sql) {
            Some(stmt) => self.client.query(stmt, &[]).await,
            None => self.client.query(sql, &[]).await,
        }
        .map_err(|e| DbError::Query(e.to_string()))?;
        Ok(RowSet::new(rows.len()))
    }

    async fn close(self) -> Result<(), DbError> {
        let Self {
            client,
            driver_task,
            prepared,
        } = self;

        // Dropping the statement queues its Close message; dropping the
        // client then sends Terminate and lets the connection task finish.
        drop(prepared);
        drop(client);

        match driver_task.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(DbError::Close(e.to_string())),
            Err(e) => Err(DbError::Close(format!("connection task failed: {e}"))),
        }
    }
}
