//! Driver capability contract.
//!
//! A [`Driver`] is the backend-specific adapter the connection handle
//! delegates to: it owns the wire protocol, the dialect quirks, and its
//! own error recovery (reconnect-and-retry lives inside the driver; the
//! layer above only observes the final outcome). Implementations are
//! never called concurrently - every call is funneled through the
//! handle's exclusive section.

use crate::config::ConnectionConfig;
use crate::db::types::QueryResult;
use crate::error::DbResult;

/// Identity tag of the backing engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseEngine {
    /// Includes MariaDB
    MySql,
    SQLite,
    /// Placeholder drivers and test doubles
    Unknown,
}

impl DatabaseEngine {
    /// Get the display name for this engine.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::MySql => "MySQL",
            Self::SQLite => "SQLite",
            Self::Unknown => "unknown",
        }
    }

    /// Get the default port for this engine.
    pub fn default_port(&self) -> Option<u16> {
        match self {
            Self::MySql => Some(3306),
            Self::SQLite | Self::Unknown => None,
        }
    }
}

impl std::fmt::Display for DatabaseEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Backend adapter consumed by [`ConnectionHandle`].
///
/// Transaction methods default to trivial success: a backend without
/// transaction support lacks integrity, not correct no-op behavior, and
/// code written against this contract keeps working on it.
///
/// [`ConnectionHandle`]: crate::db::handle::ConnectionHandle
pub trait Driver: Send {
    /// Establish the wire-level connection.
    fn connect(&mut self, config: &ConnectionConfig) -> DbResult<()>;

    /// Start a transaction.
    fn begin(&mut self) -> DbResult<()> {
        Ok(())
    }

    /// Commit the current transaction.
    fn commit(&mut self) -> DbResult<()> {
        Ok(())
    }

    /// Roll back the current transaction.
    fn rollback(&mut self) -> DbResult<()> {
        Ok(())
    }

    /// Execute a statement that produces no rows (INSERT, UPDATE, DDL).
    fn execute_statement(&mut self, statement: &str) -> DbResult<()>;

    /// Execute a statement expected to return rows, materialized.
    fn query_statement(&mut self, statement: &str) -> DbResult<QueryResult>;

    /// Quote and escape a string for inclusion in a statement.
    fn escape_string(&self, text: &str) -> String;

    /// Quote and escape a binary payload for inclusion in a statement.
    fn escape_blob(&self, bytes: &[u8]) -> String;

    /// Identifier generated by the last insert, 0 if not applicable.
    fn last_inserted_id(&mut self) -> u64 {
        0
    }

    /// Which engine this driver speaks to.
    fn engine(&self) -> DatabaseEngine;

    /// Case-insensitive comparison operator for this dialect.
    fn string_comparer(&self) -> &'static str {
        "= "
    }

    /// Row-limit clause usable on UPDATE statements, empty if unsupported.
    fn update_limiter(&self) -> &'static str {
        " LIMIT 1"
    }

    /// Whether the dialect accepts multi-row VALUES lists.
    ///
    /// Explicit capability flag; the batcher never infers this from the
    /// engine tag.
    fn multi_row_inserts(&self) -> bool {
        false
    }
}
