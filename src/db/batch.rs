//! Insert batching.
//!
//! [`InsertBatcher`] coalesces many logical row inserts into fewer
//! physical statements on dialects with multi-row VALUES support, and
//! degrades to one statement per row everywhere else. It holds no lock
//! of its own between calls; each flush acquires the connection's
//! exclusive section only for its own statement, so unrelated statements
//! may interleave between appends but never mid-statement.
//!
//! Finalization is the caller's duty: call [`flush`] after the last
//! [`add_row`] or the tail rows are silently lost. That obligation is
//! deliberate - an automatic destructor flush could fail with nobody
//! left to observe it.
//!
//! [`add_row`]: InsertBatcher::add_row
//! [`flush`]: InsertBatcher::flush

use crate::config::BatchOptions;
use crate::db::handle::ConnectionHandle;
use crate::error::DbError;
use tracing::{debug, warn};

/// Accumulator for one bulk-insert operation.
///
/// ```ignore
/// let mut batch = InsertBatcher::new(&handle);
/// batch.set_template("INSERT INTO events (kind, payload) VALUES ");
/// for event in events {
///     batch.add_row(&format!("({}, {})", event.kind, handle.escape_string(&event.payload)));
/// }
/// batch.flush()
/// ```
pub struct InsertBatcher<'a> {
    handle: &'a ConnectionHandle,
    template: String,
    /// Serialized pending rows, separators included; its length is the
    /// buffered byte size.
    buffer: String,
    pending: u32,
    flushed: u64,
    max_statement_bytes: usize,
    multi_row: bool,
}

impl<'a> InsertBatcher<'a> {
    /// Bind a batcher to the handle with default options.
    pub fn new(handle: &'a ConnectionHandle) -> Self {
        Self::with_options(handle, &BatchOptions::default())
    }

    /// Bind a batcher with an explicit statement byte budget.
    pub fn with_options(handle: &'a ConnectionHandle, options: &BatchOptions) -> Self {
        Self {
            handle,
            template: String::new(),
            buffer: String::new(),
            pending: 0,
            flushed: 0,
            max_statement_bytes: options.max_statement_bytes_or_default(),
            multi_row: handle.multi_row_inserts(),
        }
    }

    /// Set the fixed INSERT prefix (table plus column list) for every
    /// physical statement this batcher emits.
    ///
    /// Must be called before the first [`add_row`]. Rejected while rows
    /// are buffered; flush first, then retarget.
    ///
    /// [`add_row`]: InsertBatcher::add_row
    pub fn set_template(&mut self, prefix: &str) -> bool {
        if self.pending > 0 {
            warn!(pending = self.pending, "set_template with rows buffered");
            return false;
        }
        self.template = prefix.to_string();
        true
    }

    /// Append one row's serialized value list, e.g. `"(1, 'a')"`.
    ///
    /// If the physical statement would outgrow the byte budget, the
    /// current buffer is flushed first and the row starts a new one. A
    /// row that alone exceeds the budget is sent immediately as its own
    /// one-row statement rather than rejected.
    ///
    /// On false the row was not appended - except the oversized-row
    /// case, where it stays buffered for an explicit [`flush`] retry.
    /// Already-flushed rows are never lost either way.
    ///
    /// [`flush`]: InsertBatcher::flush
    pub fn add_row(&mut self, row: &str) -> bool {
        if self.template.is_empty() {
            warn!("add_row before set_template");
            return false;
        }

        // Dialect without multi-row VALUES: one statement per row, sent
        // right away; the buffer is never used.
        if !self.multi_row {
            let statement = format!("{}{}", self.template, row);
            if self.handle.execute(&statement) {
                self.flushed += 1;
                return true;
            }
            return false;
        }

        let projected =
            self.template.len() + self.buffer.len() + separator_len(self.pending) + row.len();
        if self.pending > 0 && projected > self.max_statement_bytes && !self.flush() {
            return false;
        }

        if !self.buffer.is_empty() {
            self.buffer.push(',');
        }
        self.buffer.push_str(row);
        self.pending += 1;

        // A lone row over the budget cannot be split; send it as-is.
        if self.template.len() + self.buffer.len() > self.max_statement_bytes {
            return self.flush();
        }
        true
    }

    /// Send the buffered rows as one physical statement.
    ///
    /// Empty buffer: no-op, returns true, issues nothing. On failure the
    /// buffer is left intact so the caller may retry.
    pub fn flush(&mut self) -> bool {
        if self.pending == 0 {
            return true;
        }

        let statement = format!("{}{}", self.template, self.buffer);
        debug!(
            rows = self.pending,
            bytes = statement.len(),
            "Flushing batched insert"
        );

        match self.handle.try_execute(&statement) {
            Ok(()) => {
                self.flushed += u64::from(self.pending);
                self.pending = 0;
                self.buffer.clear();
                true
            }
            Err(e) => {
                let err = DbError::batch_flush(self.pending, e);
                warn!(error = %err, "Batch flush failed, buffer retained");
                false
            }
        }
    }

    /// Rows currently buffered and not yet flushed.
    pub fn pending_rows(&self) -> u32 {
        self.pending
    }

    /// Serialized size of the pending rows in bytes.
    pub fn buffered_bytes(&self) -> usize {
        self.buffer.len()
    }

    /// Total rows delivered to the connection so far.
    pub fn flushed_rows(&self) -> u64 {
        self.flushed
    }
}

fn separator_len(pending: u32) -> usize {
    if pending > 0 { 1 } else { 0 }
}
