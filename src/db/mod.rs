//! Serialized database access core.
//!
//! This module provides the concurrency and lifecycle discipline around
//! query execution:
//! - Driver capability contract and engine metadata
//! - Connection handle funneling all access through one exclusive section
//! - Re-entrant serialized executor
//! - Scoped transaction guard with rollback-on-drop
//! - Insert batching with a statement byte budget

pub mod batch;
pub mod driver;
pub mod executor;
pub mod handle;
pub mod transaction;
pub mod types;

pub use batch::InsertBatcher;
pub use driver::{DatabaseEngine, Driver};
pub use executor::{SectionPermit, SerializedExecutor};
pub use handle::{ConnectionHandle, ConnectionPermit};
pub use transaction::TransactionGuard;
pub use types::{QueryResult, Value};
