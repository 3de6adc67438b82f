//! Configuration for the serialized access layer.
//!
//! This module provides the connection parameters handed to a driver at
//! connect time and the tunables for insert batching. Connection-string
//! parsing belongs to the surrounding application, not to this crate.

use serde::{Deserialize, Serialize};

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 3306;

// Batching defaults. The statement budget is sized well under the common
// MySQL max_allowed_packet floor so a flushed statement always fits.
pub const DEFAULT_MAX_STATEMENT_BYTES: usize = 1024 * 1024;

/// Parameters for a driver-level connection.
///
/// Not every backend uses every field: the SQLite adapter reads only
/// `database` (the file path, or `:memory:`), while a MySQL-family
/// adapter uses all of them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub user: String,
    /// Contains sensitive data - never log
    #[serde(default, skip_serializing)]
    pub password: String,
    pub database: String,
    /// Preferred over host/port by drivers that support it, when set.
    #[serde(default)]
    pub unix_socket: Option<String>,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl ConnectionConfig {
    /// Build a config targeting a specific database with defaults for the rest.
    pub fn for_database(database: impl Into<String>) -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            user: String::new(),
            password: String::new(),
            database: database.into(),
            unix_socket: None,
        }
    }

    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.database.is_empty() {
            return Err("database must not be empty".to_string());
        }
        if self.host.is_empty() && self.unix_socket.is_none() {
            return Err("either host or unix_socket must be set".to_string());
        }
        Ok(())
    }
}

/// Tunables for the insert batcher.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchOptions {
    /// Maximum physical statement size in bytes, template included
    /// (default: 1 MiB). A single row larger than this still goes out
    /// as its own statement.
    pub max_statement_bytes: Option<usize>,
}

impl BatchOptions {
    /// Get max_statement_bytes with the default value.
    pub fn max_statement_bytes_or_default(&self) -> usize {
        self.max_statement_bytes
            .unwrap_or(DEFAULT_MAX_STATEMENT_BYTES)
    }

    /// Validate batch options and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(max) = self.max_statement_bytes {
            if max == 0 {
                return Err("max_statement_bytes must be greater than 0".to_string());
            }
        }
        Ok(())
    }
}
