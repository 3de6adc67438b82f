//! Scoped transaction guard.
//!
//! A [`TransactionGuard`] models one unit of work as an explicit state
//! machine: FRESH until `begin` succeeds, OPEN until `commit` or drop,
//! DONE afterward and inert. Dropping the guard while OPEN rolls the
//! transaction back, so an error path that skips `commit` fails safe
//! (nothing applied) instead of leaving the connection in an
//! indeterminate transactional state.
//!
//! From a successful `begin` until DONE the guard holds the connection's
//! exclusive section: statements issued by the same thread inside the
//! span re-enter it, unrelated callers wait.

use crate::db::handle::{ConnectionHandle, ConnectionPermit};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TransactionState {
    Fresh,
    Open,
    Done,
}

/// Scoped begin/commit/auto-rollback around a [`ConnectionHandle`].
///
/// ```ignore
/// let mut tx = TransactionGuard::new(&handle);
/// if !tx.begin() {
///     return false; // unit of work is not protected
/// }
/// handle.execute("UPDATE accounts SET balance = balance - 10 WHERE id = 1");
/// handle.execute("UPDATE accounts SET balance = balance + 10 WHERE id = 2");
/// tx.commit()
/// // dropped without commit() -> rolled back
/// ```
pub struct TransactionGuard<'a> {
    handle: &'a ConnectionHandle,
    permit: Option<ConnectionPermit<'a>>,
    state: TransactionState,
}

impl<'a> TransactionGuard<'a> {
    /// Bind a fresh guard to the handle. No driver call happens yet.
    pub fn new(handle: &'a ConnectionHandle) -> Self {
        Self {
            handle,
            permit: None,
            state: TransactionState::Fresh,
        }
    }

    /// Start the transaction.
    ///
    /// Only valid while FRESH. On success the guard is OPEN and holds
    /// the exclusive section. On failure it stays FRESH, holds nothing,
    /// and the unit of work must not be treated as protected; `begin`
    /// may be attempted again.
    pub fn begin(&mut self) -> bool {
        if self.state != TransactionState::Fresh {
            warn!("begin on a non-fresh transaction guard");
            return false;
        }

        let permit = self.handle.acquire();
        match self.handle.begin_driver() {
            Ok(()) => {
                self.permit = Some(permit);
                self.state = TransactionState::Open;
                debug!("Transaction opened");
                true
            }
            Err(e) => {
                // Permit drops here; the section is not kept for a
                // transaction that never opened.
                warn!(error = %e, "Transaction begin failed");
                false
            }
        }
    }

    /// Commit the transaction.
    ///
    /// Only valid while OPEN. The guard moves to DONE whether or not the
    /// driver commit succeeds - a failed commit cannot be retried
    /// through the same guard - and the exclusive section is released.
    /// Returns the driver's answer.
    pub fn commit(&mut self) -> bool {
        if self.state != TransactionState::Open {
            return false;
        }

        self.state = TransactionState::Done;
        let result = self.handle.commit_driver();
        self.permit = None;

        match result {
            Ok(()) => {
                debug!("Transaction committed");
                true
            }
            Err(e) => {
                warn!(error = %e, "Transaction commit failed");
                false
            }
        }
    }
}

impl Drop for TransactionGuard<'_> {
    fn drop(&mut self) {
        if self.state != TransactionState::Open {
            return;
        }

        // Abandoned while open: best-effort rollback. There is no caller
        // left to report a failure to; it is logged for telemetry.
        match self.handle.rollback_driver() {
            Ok(()) => debug!("Rolled back abandoned transaction"),
            Err(e) => warn!(error = %e, "Rollback of abandoned transaction failed"),
        }
        self.state = TransactionState::Done;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConnectionConfig;
    use crate::db::driver::{DatabaseEngine, Driver};
    use crate::db::types::QueryResult;
    use crate::error::{DbError, DbResult};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Default)]
    struct Counters {
        begins: AtomicU32,
        commits: AtomicU32,
        rollbacks: AtomicU32,
    }

    struct CountingDriver {
        counters: Arc<Counters>,
        fail_begin: bool,
        fail_commit: bool,
    }

    impl CountingDriver {
        fn new(counters: Arc<Counters>) -> Self {
            Self {
                counters,
                fail_begin: false,
                fail_commit: false,
            }
        }
    }

    impl Driver for CountingDriver {
        fn connect(&mut self, _config: &ConnectionConfig) -> DbResult<()> {
            Ok(())
        }

        fn begin(&mut self) -> DbResult<()> {
            if self.fail_begin {
                return Err(DbError::transaction("begin", "scripted failure"));
            }
            self.counters.begins.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn commit(&mut self) -> DbResult<()> {
            if self.fail_commit {
                return Err(DbError::transaction("commit", "scripted failure"));
            }
            self.counters.commits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn rollback(&mut self) -> DbResult<()> {
            self.counters.rollbacks.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn execute_statement(&mut self, _statement: &str) -> DbResult<()> {
            Ok(())
        }

        fn query_statement(&mut self, _statement: &str) -> DbResult<QueryResult> {
            Ok(QueryResult::empty())
        }

        fn escape_string(&self, text: &str) -> String {
            format!("'{}'", text)
        }

        fn escape_blob(&self, _bytes: &[u8]) -> String {
            "''".to_string()
        }

        fn engine(&self) -> DatabaseEngine {
            DatabaseEngine::Unknown
        }
    }

    fn setup(fail_begin: bool, fail_commit: bool) -> (ConnectionHandle, Arc<Counters>) {
        let counters = Arc::new(Counters::default());
        let mut driver = CountingDriver::new(Arc::clone(&counters));
        driver.fail_begin = fail_begin;
        driver.fail_commit = fail_commit;
        (ConnectionHandle::new(Box::new(driver)), counters)
    }

    #[test]
    fn test_begin_commit_happy_path() {
        let (handle, counters) = setup(false, false);
        let mut tx = TransactionGuard::new(&handle);
        assert!(tx.begin());
        assert!(handle.execute("INSERT INTO t VALUES (1)"));
        assert!(tx.commit());
        drop(tx);

        assert_eq!(counters.begins.load(Ordering::SeqCst), 1);
        assert_eq!(counters.commits.load(Ordering::SeqCst), 1);
        assert_eq!(counters.rollbacks.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_drop_while_open_rolls_back() {
        let (handle, counters) = setup(false, false);
        {
            let mut tx = TransactionGuard::new(&handle);
            assert!(tx.begin());
            // no commit
        }
        assert_eq!(counters.rollbacks.load(Ordering::SeqCst), 1);
        assert_eq!(counters.commits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_commit_twice_is_inert() {
        let (handle, counters) = setup(false, false);
        let mut tx = TransactionGuard::new(&handle);
        assert!(tx.begin());
        assert!(tx.commit());
        assert!(!tx.commit());
        assert_eq!(counters.commits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_begin_stays_fresh_no_rollback() {
        let (handle, counters) = setup(true, false);
        {
            let mut tx = TransactionGuard::new(&handle);
            assert!(!tx.begin());
        }
        assert_eq!(counters.begins.load(Ordering::SeqCst), 0);
        assert_eq!(counters.rollbacks.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_failed_commit_moves_to_done() {
        let (handle, counters) = setup(false, true);
        {
            let mut tx = TransactionGuard::new(&handle);
            assert!(tx.begin());
            assert!(!tx.commit());
            // DONE despite the failure: drop must not roll back.
        }
        assert_eq!(counters.rollbacks.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_commit_before_begin_is_inert() {
        let (handle, counters) = setup(false, false);
        let mut tx = TransactionGuard::new(&handle);
        assert!(!tx.commit());
        assert_eq!(counters.commits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_begin_twice_rejected() {
        let (handle, counters) = setup(false, false);
        let mut tx = TransactionGuard::new(&handle);
        assert!(tx.begin());
        assert!(!tx.begin());
        assert_eq!(counters.begins.load(Ordering::SeqCst), 1);
        tx.commit();
    }
}
