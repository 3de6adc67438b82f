//! sqlgate - serialized access to a single shared SQL connection.
//!
//! This library is the discipline around a process's one database
//! connection: a [`ConnectionHandle`] owning an interchangeable backend
//! [`Driver`], a re-entrant [`SerializedExecutor`] section so concurrent
//! callers never interleave statements, a [`TransactionGuard`] that
//! rolls back abandoned units of work, and an [`InsertBatcher`] that
//! coalesces bulk inserts on dialects with multi-row VALUES support.
//!
//! ```ignore
//! use sqlgate::{ConnectionConfig, ConnectionHandle, TransactionGuard};
//! use sqlgate::backends::SqliteDriver;
//!
//! let handle = ConnectionHandle::new(Box::new(SqliteDriver::new()));
//! handle.connect(&ConnectionConfig::for_database("app.db"));
//!
//! let mut tx = TransactionGuard::new(&handle);
//! if tx.begin() {
//!     handle.execute("INSERT INTO audit (event) VALUES ('started')");
//!     tx.commit();
//! }
//! ```

pub mod backends;
pub mod config;
pub mod db;
pub mod error;

pub use config::{BatchOptions, ConnectionConfig};
pub use db::{
    ConnectionHandle, ConnectionPermit, DatabaseEngine, Driver, InsertBatcher, QueryResult,
    SectionPermit, SerializedExecutor, TransactionGuard, Value,
};
pub use error::{DbError, DbResult};
