//! Shared test driver for integration tests.
//!
//! Records every driver-level call into one ordered log and tracks how
//! many statements are in flight at once, so tests can assert on
//! serialization and on exactly what reached the backend.

#![allow(dead_code)]

use sqlgate::{ConnectionConfig, DatabaseEngine, DbError, DbResult, Driver, QueryResult};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Install a test subscriber once; respects RUST_LOG.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Default)]
pub struct DriverState {
    /// Ordered log of BEGIN/COMMIT/ROLLBACK markers and statements.
    pub log: Mutex<Vec<String>>,
    pub in_flight: AtomicU32,
    pub max_in_flight: AtomicU32,
    pub fail_begin: AtomicBool,
    pub fail_commit: AtomicBool,
    pub fail_statements: AtomicBool,
}

impl DriverState {
    pub fn log_snapshot(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn statements(&self) -> Vec<String> {
        self.log_snapshot()
            .into_iter()
            .filter(|e| !matches!(e.as_str(), "BEGIN" | "COMMIT" | "ROLLBACK"))
            .collect()
    }
}

/// Instrumented fake driver.
pub struct RecordingDriver {
    pub state: Arc<DriverState>,
    pub multi_row: bool,
    /// Hold each statement open briefly to widen overlap windows.
    pub statement_delay: Option<Duration>,
}

impl RecordingDriver {
    pub fn new(state: Arc<DriverState>) -> Self {
        Self {
            state,
            multi_row: true,
            statement_delay: None,
        }
    }

    fn record(&self, entry: &str) {
        self.state.log.lock().unwrap().push(entry.to_string());
    }

    fn enter_statement(&self) {
        let now = self.state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.statement_delay {
            thread::sleep(delay);
        }
    }

    fn exit_statement(&self) {
        self.state.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Driver for RecordingDriver {
    fn connect(&mut self, _config: &ConnectionConfig) -> DbResult<()> {
        Ok(())
    }

    fn begin(&mut self) -> DbResult<()> {
        if self.state.fail_begin.load(Ordering::SeqCst) {
            return Err(DbError::transaction("begin", "scripted failure"));
        }
        self.record("BEGIN");
        Ok(())
    }

    fn commit(&mut self) -> DbResult<()> {
        if self.state.fail_commit.load(Ordering::SeqCst) {
            return Err(DbError::transaction("commit", "scripted failure"));
        }
        self.record("COMMIT");
        Ok(())
    }

    fn rollback(&mut self) -> DbResult<()> {
        self.record("ROLLBACK");
        Ok(())
    }

    fn execute_statement(&mut self, statement: &str) -> DbResult<()> {
        self.enter_statement();
        let failed = self.state.fail_statements.load(Ordering::SeqCst);
        if !failed {
            self.record(statement);
        }
        self.exit_statement();
        if failed {
            Err(DbError::statement("scripted failure", None))
        } else {
            Ok(())
        }
    }

    fn query_statement(&mut self, statement: &str) -> DbResult<QueryResult> {
        self.enter_statement();
        self.record(statement);
        self.exit_statement();
        Ok(QueryResult::empty())
    }

    fn escape_string(&self, text: &str) -> String {
        format!("'{}'", text.replace('\'', "''"))
    }

    fn escape_blob(&self, _bytes: &[u8]) -> String {
        "''".to_string()
    }

    fn engine(&self) -> DatabaseEngine {
        DatabaseEngine::Unknown
    }

    fn multi_row_inserts(&self) -> bool {
        self.multi_row
    }
}
