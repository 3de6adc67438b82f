//! SQLite driver adapter over rusqlite.
//!
//! The reference [`Driver`] implementation. The config's `database`
//! field is the file path (`:memory:` for an in-memory database);
//! host, port, and credentials are ignored.

use crate::config::ConnectionConfig;
use crate::db::driver::{DatabaseEngine, Driver};
use crate::db::types::{QueryResult, Value};
use crate::error::{DbError, DbResult};
use rusqlite::Connection;
use rusqlite::types::ValueRef;
use std::fmt::Write as _;
use std::time::Duration;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Driver speaking to a local SQLite database.
#[derive(Default)]
pub struct SqliteDriver {
    conn: Option<Connection>,
}

impl SqliteDriver {
    pub fn new() -> Self {
        Self::default()
    }

    fn conn(&mut self) -> DbResult<&mut Connection> {
        self.conn
            .as_mut()
            .ok_or_else(|| DbError::connection("not connected"))
    }
}

impl Driver for SqliteDriver {
    fn connect(&mut self, config: &ConnectionConfig) -> DbResult<()> {
        let conn = if config.database == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(&config.database)?
        };
        conn.busy_timeout(BUSY_TIMEOUT)?;
        self.conn = Some(conn);
        Ok(())
    }

    fn begin(&mut self) -> DbResult<()> {
        self.conn()?
            .execute_batch("BEGIN")
            .map_err(|e| DbError::transaction("begin", e.to_string()))
    }

    fn commit(&mut self) -> DbResult<()> {
        self.conn()?
            .execute_batch("COMMIT")
            .map_err(|e| DbError::transaction("commit", e.to_string()))
    }

    fn rollback(&mut self) -> DbResult<()> {
        self.conn()?
            .execute_batch("ROLLBACK")
            .map_err(|e| DbError::transaction("rollback", e.to_string()))
    }

    fn execute_statement(&mut self, statement: &str) -> DbResult<()> {
        self.conn()?.execute_batch(statement).map_err(DbError::from)
    }

    fn query_statement(&mut self, statement: &str) -> DbResult<QueryResult> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(statement)?;
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
        let column_count = columns.len();

        let mut rows = stmt.query([])?;
        let mut data = Vec::new();
        while let Some(row) = rows.next()? {
            let mut cells = Vec::with_capacity(column_count);
            for i in 0..column_count {
                cells.push(match row.get_ref(i)? {
                    ValueRef::Null => Value::Null,
                    ValueRef::Integer(v) => Value::Integer(v),
                    ValueRef::Real(v) => Value::Real(v),
                    ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
                    ValueRef::Blob(b) => Value::Blob(b.to_vec()),
                });
            }
            data.push(cells);
        }

        Ok(QueryResult::new(columns, data))
    }

    fn escape_string(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len() + 2);
        out.push('\'');
        for ch in text.chars() {
            if ch == '\'' {
                out.push('\'');
            }
            out.push(ch);
        }
        out.push('\'');
        out
    }

    fn escape_blob(&self, bytes: &[u8]) -> String {
        let mut out = String::with_capacity(bytes.len() * 2 + 3);
        out.push_str("X'");
        for b in bytes {
            let _ = write!(out, "{:02X}", b);
        }
        out.push('\'');
        out
    }

    fn last_inserted_id(&mut self) -> u64 {
        match &self.conn {
            Some(conn) => u64::try_from(conn.last_insert_rowid()).unwrap_or(0),
            None => 0,
        }
    }

    fn engine(&self) -> DatabaseEngine {
        DatabaseEngine::SQLite
    }

    fn string_comparer(&self) -> &'static str {
        "LIKE "
    }

    fn update_limiter(&self) -> &'static str {
        // SQLite is not normally built with UPDATE ... LIMIT support.
        ""
    }

    fn multi_row_inserts(&self) -> bool {
        true
    }
}
