//! Replay rejection over recently admitted message ids.
//!
//! The protocol rule: remember the last N distinct message ids received from
//! the peer; reject any duplicate of a remembered id, and once the memory is
//! full, reject anything older than the oldest remembered id. The window is
//! keyed by id value, not arrival time - ids are time-derived, so "older"
//! means numerically smaller.

use std::collections::BTreeSet;

use crate::error::ReplayError;

/// Number of admitted ids remembered per session by default.
pub const DEFAULT_WINDOW_CAPACITY: usize = 300;

/// Bounded, ordered set of the most recently admitted message ids.
///
/// # Invariants
///
/// - Size never exceeds the configured capacity
/// - The stored minimum is the "oldest admitted" watermark
/// - Failed checks never mutate the set
pub struct DuplicateWindow {
    capacity: usize,
    seen: BTreeSet<i64>,
}

impl DuplicateWindow {
    /// Create an empty window remembering up to `capacity` ids.
    pub fn new(capacity: usize) -> Self {
        Self { capacity, seen: BTreeSet::new() }
    }

    /// Check a message id for admission, recording it on success.
    ///
    /// # Errors
    ///
    /// - [`ReplayError::TooOld`] when the window is full and the id is below
    ///   every remembered id
    /// - [`ReplayError::Duplicate`] when the id is already remembered
    pub fn check(&mut self, message_id: i64) -> Result<(), ReplayError> {
        if self.seen.len() == self.capacity {
            if let Some(&oldest) = self.seen.first() {
                if message_id < oldest {
                    return Err(ReplayError::TooOld { message_id, oldest });
                }
            }
        }

        // Inserting an already-present value leaves the set untouched, so the
        // duplicate path keeps the no-mutation-on-failure invariant.
        if !self.seen.insert(message_id) {
            return Err(ReplayError::Duplicate { message_id });
        }

        if self.seen.len() > self.capacity {
            self.seen.pop_first();
        }

        Ok(())
    }

    /// Number of ids currently remembered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// True when no ids have been admitted yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// The oldest remembered id, if any.
    #[must_use]
    pub fn oldest(&self) -> Option<i64> {
        self.seen.first().copied()
    }
}
