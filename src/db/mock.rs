//! In-memory driver for tests
//!
//! Simulates latency and injects connect, prepare, query and close failures.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;

use super::driver::{Connection, DbError, Driver, RowSet};

/// Shared call counters, readable after a run
#[derive(Debug, Default)]
pub struct MockStats {
    pub connects: AtomicU64,
    pub prepares: AtomicU64,
    pub queries: AtomicU64,
    pub closes: AtomicU64,
}

impl MockStats {
    pub fn connects(&self) -> u64 {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn prepares(&self) -> u64 {
        self.prepares.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> u64 {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> u64 {
        self.closes.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Debug)]
pub struct MockDriver {
    latency: Duration,
    /// Delay spent in `prepare`
    setup_latency: Duration,
    fail_connect: bool,
    fail_prepare: bool,
    /// Fail every n-th query of a connection (1 = every query)
    fail_every: Option<u64>,
    empty_rows: bool,
    fail_close: bool,
    stats: Arc<MockStats>,
}

impl MockDriver {
    pub fn new() -> Self {
        Self {
            latency: Duration::from_micros(200),
            setup_latency: Duration::ZERO,
            fail_connect: false,
            fail_prepare: false,
            fail_every: None,
            empty_rows: false,
            fail_close: false,
            stats: Arc::new(MockStats::default()),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_setup_latency(mut self, latency: Duration) -> Self {
        self.setup_latency = latency;
        self
    }

    pub fn failing_prepare(mut self) -> Self {
        self.fail_prepare = true;
        self
    }

    pub fn failing_connect(mut self) -> Self {
        self.fail_connect = true;
        self
    }

    pub fn failing_every(mut self, n: u64) -> Self {
        self.fail_every = Some(n);
        self
    }

    pub fn with_empty_rows(mut self) -> Self {
        self.empty_rows = true;
        self
    }

    pub fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    pub fn stats(&self) -> Arc<MockStats> {
        self.stats.clone()
    }
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl Driver for MockDriver {
    type Conn = MockConnection;

    async fn connect(&self, url: &str) -> Result<Self::Conn, DbError> {
        self.stats.connects.fetch_add(1, Ordering::SeqCst);
        if self.fail_connect {
            return Err(DbError::Connect(format!("refused: {url}")));
        }
        Ok(MockConnection {
            driver: self.clone(),
            issued: 0,
        })
    }
}

pub struct MockConnection {
    driver: MockDriver,
    issued: u64,
}

impl Connection for MockConnection {
    async fn prepare(&mut self, sql: &str) -> Result<(), DbError> {
        self.driver.stats.prepares.fetch_add(1, Ordering::SeqCst);
        sleep(self.driver.setup_latency).await;
        if self.driver.fail_prepare {
            return Err(DbError::Prepare(format!("injected failure for {sql}")));
        }
        Ok(())
    }

    async fn query(&mut self, sql: &str) -> Result<RowSet, DbError> {
        self.issued += 1;
        self.driver.stats.queries.fetch_add(1, Ordering::SeqCst);
        sleep(self.driver.latency).await;

        if let Some(n) = self.driver.fail_every {
            if self.issued % n == 0 {
                return Err(DbError::Query(format!("injected failure for {sql}")));
            }
        }
        if self.driver.empty_rows {
            return Ok(RowSet::new(0));
        }
        Ok(RowSet::new(1))
    }

    async fn close(self) -> Result<(), DbError> {
        self.driver.stats.closes.fetch_add(1, Ordering::SeqCst);
        if self.driver.fail_close {
            return Err(DbError::Close("injected close failure".to_string()));
        }
        Ok(())
    }
}
