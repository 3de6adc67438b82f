//! Re-entrant exclusive section serializing access to the connection.
//!
//! The underlying driver connection is not safe for concurrent use, and
//! statement ordering (last-inserted-id semantics, transaction
//! boundaries) depends on strict serialization. Every component in this
//! crate funnels through one [`SerializedExecutor`]; no other lock
//! exists. The section is re-entrant per thread so a transaction guard
//! holding it across begin..commit can still issue statements through
//! the same handle without deadlocking itself.

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use std::cell::RefCell;

/// Exclusive, re-entrant section around a piece of shared state.
///
/// Generic over the guarded state so it stays decoupled from any
/// particular statement-building type; the connection handle instantiates
/// it with its driver slot.
pub struct SerializedExecutor<T> {
    section: ReentrantMutex<RefCell<T>>,
}

impl<T> SerializedExecutor<T> {
    /// Wrap `state` in a fresh exclusive section.
    pub fn new(state: T) -> Self {
        Self {
            section: ReentrantMutex::new(RefCell::new(state)),
        }
    }

    /// Block until the section is free (or already held by this thread)
    /// and return a scoped permit.
    ///
    /// There is no timeout and no fairness guarantee beyond eventual
    /// progress. The permit releases on scope exit on every path.
    pub fn acquire(&self) -> SectionPermit<'_, T> {
        SectionPermit {
            guard: self.section.lock(),
        }
    }
}

/// Scoped permit for a [`SerializedExecutor`] section.
///
/// While any permit for a section is alive, `acquire` from other threads
/// blocks; the owning thread may acquire again freely.
pub struct SectionPermit<'a, T> {
    guard: ReentrantMutexGuard<'a, RefCell<T>>,
}

impl<T> SectionPermit<'_, T> {
    /// Run `f` with mutable access to the guarded state.
    ///
    /// The borrow lasts only for the call; `f` must not re-enter `with`
    /// on a permit for the same section.
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.guard.borrow_mut())
    }
}
