//! Process-wide connection handle.
//!
//! One [`ConnectionHandle`] owns the single live driver instance and
//! funnels every touch of it through the crate's one exclusive section.
//! The intended deployment is one handle per process, shared by
//! reference (typically an `Arc`); there is no global accessor.
//!
//! All methods fail closed: driver errors are logged and surfaced as
//! `false`/`None`, never as panics, so callers on backends without
//! integrity guarantees can still make forward progress by checking
//! return values.

use crate::config::ConnectionConfig;
use crate::db::driver::{DatabaseEngine, Driver};
use crate::db::executor::{SectionPermit, SerializedExecutor};
use crate::db::types::QueryResult;
use crate::error::DbResult;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Driver instance plus the connectivity bookkeeping guarded with it.
pub(crate) struct DriverSlot {
    pub(crate) driver: Box<dyn Driver>,
    pub(crate) connected: bool,
    pub(crate) last_use: Instant,
}

/// Exclusive access token for the connection.
///
/// While held, no other thread's statements can interleave with the
/// holder's. The owning thread re-enters freely, so holding a permit and
/// then calling [`ConnectionHandle::execute`] is fine. Do not hold a
/// permit across unrelated blocking work; every other database user in
/// the process stalls behind it.
pub struct ConnectionPermit<'a> {
    _permit: SectionPermit<'a, DriverSlot>,
}

/// Owner of the single driver connection.
pub struct ConnectionHandle {
    executor: SerializedExecutor<DriverSlot>,
}

impl ConnectionHandle {
    /// Wrap a driver instance. The handle starts disconnected.
    pub fn new(driver: Box<dyn Driver>) -> Self {
        Self {
            executor: SerializedExecutor::new(DriverSlot {
                driver,
                connected: false,
                last_use: Instant::now(),
            }),
        }
    }

    /// Attempt a driver-level connection.
    ///
    /// Returns whether connectivity was achieved and records it in the
    /// connected flag; nothing else changes on failure.
    pub fn connect(&self, config: &ConnectionConfig) -> bool {
        self.executor.acquire().with(|slot| {
            match slot.driver.connect(config) {
                Ok(()) => {
                    slot.connected = true;
                    slot.last_use = Instant::now();
                    info!(
                        engine = %slot.driver.engine(),
                        database = %config.database,
                        "Connected"
                    );
                }
                Err(e) => {
                    slot.connected = false;
                    warn!(error = %e, database = %config.database, "Connect failed");
                }
            }
            slot.connected
        })
    }

    /// Drop the connected flag. The driver connection itself is released
    /// when the handle is dropped.
    pub fn disconnect(&self) {
        self.executor.acquire().with(|slot| {
            slot.connected = false;
        });
        info!("Disconnected");
    }

    /// Whether the last connect/statement left the connection usable.
    pub fn is_connected(&self) -> bool {
        self.executor.acquire().with(|slot| slot.connected)
    }

    /// Record now as the last-use timestamp.
    ///
    /// Idle bookkeeping is caller-driven (keep-alive loops); nothing in
    /// the handle acts on it. Statement traffic refreshes it as well.
    pub fn mark_used(&self) {
        self.executor.acquire().with(|slot| {
            slot.last_use = Instant::now();
        });
    }

    /// Time since the connection was last used.
    pub fn idle_for(&self) -> Duration {
        self.executor.acquire().with(|slot| slot.last_use.elapsed())
    }

    /// Acquire the exclusive section explicitly.
    ///
    /// Lets a caller group several statements into one unit no other
    /// thread can interleave with. Transaction guards do this
    /// internally for the begin..commit span.
    pub fn acquire(&self) -> ConnectionPermit<'_> {
        ConnectionPermit {
            _permit: self.executor.acquire(),
        }
    }

    /// Execute a statement that returns no rows.
    ///
    /// Driver-internal recovery (reconnect, retry) happens before this
    /// returns; no retry is performed at this layer.
    pub fn execute(&self, statement: &str) -> bool {
        self.try_execute(statement).is_ok()
    }

    pub(crate) fn try_execute(&self, statement: &str) -> DbResult<()> {
        self.executor.acquire().with(|slot| {
            slot.last_use = Instant::now();
            match slot.driver.execute_statement(statement) {
                Ok(()) => {
                    debug!(statement = %statement, "Executed");
                    Ok(())
                }
                Err(e) => {
                    Self::note_failure(slot, &e, statement);
                    Err(e)
                }
            }
        })
    }

    /// Execute a statement expected to return rows.
    ///
    /// `None` on failure; a successful query with zero rows yields an
    /// empty result.
    pub fn query(&self, statement: &str) -> Option<QueryResult> {
        self.executor.acquire().with(|slot| {
            slot.last_use = Instant::now();
            match slot.driver.query_statement(statement) {
                Ok(result) => {
                    debug!(statement = %statement, rows = result.row_count(), "Queried");
                    Some(result)
                }
                Err(e) => {
                    Self::note_failure(slot, &e, statement);
                    None
                }
            }
        })
    }

    /// Quote and escape a string for statement inclusion.
    pub fn escape_string(&self, text: &str) -> String {
        self.executor
            .acquire()
            .with(|slot| slot.driver.escape_string(text))
    }

    /// Quote and escape a binary payload for statement inclusion.
    pub fn escape_blob(&self, bytes: &[u8]) -> String {
        self.executor
            .acquire()
            .with(|slot| slot.driver.escape_blob(bytes))
    }

    /// Identifier generated by the last insert, 0 if not applicable.
    pub fn last_inserted_id(&self) -> u64 {
        self.executor
            .acquire()
            .with(|slot| slot.driver.last_inserted_id())
    }

    /// Engine identity tag of the underlying driver.
    pub fn engine(&self) -> DatabaseEngine {
        self.executor.acquire().with(|slot| slot.driver.engine())
    }

    /// Case-insensitive comparison operator for the dialect.
    pub fn string_comparer(&self) -> &'static str {
        self.executor
            .acquire()
            .with(|slot| slot.driver.string_comparer())
    }

    /// Row-limit clause for UPDATE statements, empty if unsupported.
    pub fn update_limiter(&self) -> &'static str {
        self.executor
            .acquire()
            .with(|slot| slot.driver.update_limiter())
    }

    /// Whether the dialect accepts multi-row VALUES lists.
    pub fn multi_row_inserts(&self) -> bool {
        self.executor
            .acquire()
            .with(|slot| slot.driver.multi_row_inserts())
    }

    pub(crate) fn begin_driver(&self) -> DbResult<()> {
        self.executor.acquire().with(|slot| slot.driver.begin())
    }

    pub(crate) fn commit_driver(&self) -> DbResult<()> {
        self.executor.acquire().with(|slot| slot.driver.commit())
    }

    pub(crate) fn rollback_driver(&self) -> DbResult<()> {
        self.executor.acquire().with(|slot| slot.driver.rollback())
    }

    fn note_failure(slot: &mut DriverSlot, error: &crate::error::DbError, statement: &str) {
        warn!(error = %error, statement = %statement, "Statement failed");
        if error.is_fatal() {
            slot.connected = false;
        }
    }
}
