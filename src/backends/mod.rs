//! Backend driver adapters.
//!
//! Each adapter implements [`Driver`](crate::db::Driver) for one engine.
//! The SQLite adapter ships with the crate (feature `sqlite`); others
//! live with the applications that need them.

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDriver;
