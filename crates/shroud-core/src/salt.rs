//! Server salt rotation.
//!
//! The server periodically pushes a batch of future salts, each valid over a
//! half-open time interval. The store keeps them sorted by `valid_since`
//! descending (earliest-upcoming at the tail) and lazily promotes the tail
//! into the current slot whenever its interval has started. There is no
//! current salt at all until the first promotion.

use serde::{Deserialize, Serialize};

/// A server-rotated secret mixed into message authentication, valid over a
/// time interval in server time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ServerSalt {
    /// The secret value.
    pub salt: i64,
    /// Start of the validity interval, unix seconds in server time.
    pub valid_since: f64,
    /// End of the validity interval, unix seconds in server time.
    pub valid_until: f64,
}

impl ServerSalt {
    /// True while the salt's validity interval has not ended.
    #[must_use]
    pub fn is_valid_at(&self, server_time: f64) -> bool {
        self.valid_until > server_time
    }
}

/// Store of the current salt and the server-provided future salts.
///
/// All time parameters are server time; the session layer converts from
/// local time before calling in.
#[derive(Debug, Clone, Default)]
pub struct SaltStore {
    current: Option<ServerSalt>,
    /// Sorted by `valid_since` descending, so the next salt to promote is at
    /// the tail.
    future: Vec<ServerSalt>,
}

impl SaltStore {
    /// An empty store: no current salt, no future salts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the future salts with a fresh server-provided batch.
    ///
    /// An empty batch is ignored. The current salt is untouched except
    /// through the promotion pass that runs afterwards.
    pub fn replace(&mut self, mut salts: Vec<ServerSalt>, server_time: f64) {
        if salts.is_empty() {
            return;
        }
        salts.sort_by(|a, b| b.valid_since.total_cmp(&a.valid_since));
        self.future = salts;
        self.advance(server_time);
    }

    /// Promote every future salt whose validity has started.
    ///
    /// Afterwards the current salt is the most recent one whose interval has
    /// begun, among those known - possibly already expired if the server has
    /// not pushed replacements in time.
    pub fn advance(&mut self, server_time: f64) {
        while self.future.last().map_or(false, |salt| salt.valid_since < server_time) {
            self.current = self.future.pop();
            tracing::debug!(salt = ?self.current, "promoted server salt");
        }
    }

    /// The current salt value, if any salt's validity has ever started.
    pub fn current(&mut self, server_time: f64) -> Option<i64> {
        self.advance(server_time);
        self.current.map(|salt| salt.salt)
    }

    /// True while the current salt exists and has not expired.
    pub fn has_valid(&mut self, server_time: f64) -> bool {
        self.advance(server_time);
        self.current.map_or(false, |salt| salt.is_valid_at(server_time))
    }

    /// Every salt the store knows, future salts first, for persistence.
    pub fn all(&mut self, server_time: f64) -> Vec<ServerSalt> {
        self.advance(server_time);
        let mut salts = self.future.clone();
        if let Some(current) = self.current {
            salts.push(current);
        }
        salts
    }

    /// Number of not-yet-promoted future salts.
    #[must_use]
    pub fn future_len(&self) -> usize {
        self.future.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn salt(value: i64, since: f64, until: f64) -> ServerSalt {
        ServerSalt { salt: value, valid_since: since, valid_until: until }
    }

    #[test]
    fn empty_store_has_no_salt() {
        let mut store = SaltStore::new();
        assert_eq!(store.current(100.0), None);
        assert!(!store.has_valid(100.0));
        assert!(store.all(100.0).is_empty());
    }

    #[test]
    fn empty_batch_is_ignored() {
        let mut store = SaltStore::new();
        store.replace(vec![salt(1, 0.0, 10.0)], 5.0);
        assert_eq!(store.current(5.0), Some(1));

        store.replace(Vec::new(), 5.0);
        assert_eq!(store.current(5.0), Some(1));
    }

    #[test]
    fn promotes_through_every_started_interval() {
        let mut store = SaltStore::new();
        store.replace(
            vec![salt(1, 10.0, 20.0), salt(2, 20.0, 30.0), salt(3, 30.0, 40.0)],
            0.0,
        );

        // Nothing started yet.
        assert_eq!(store.current(0.0), None);
        assert_eq!(store.future_len(), 3);

        // Past the last interval start: the store skips straight to salt 3
        // and the future queue drains.
        assert_eq!(store.current(35.0), Some(3));
        assert_eq!(store.future_len(), 0);
        assert!(store.has_valid(35.0));
    }

    #[test]
    fn expired_current_is_reported_but_not_valid() {
        let mut store = SaltStore::new();
        store.replace(vec![salt(7, 10.0, 20.0)], 15.0);

        assert_eq!(store.current(25.0), Some(7));
        assert!(!store.has_valid(25.0));
    }

    #[test]
    fn replace_is_wholesale_for_future_salts() {
        let mut store = SaltStore::new();
        store.replace(vec![salt(1, 10.0, 20.0), salt(2, 20.0, 30.0)], 15.0);
        assert_eq!(store.current(15.0), Some(1));

        // New batch discards the old future salts but not the current one.
        store.replace(vec![salt(9, 100.0, 200.0)], 15.0);
        assert_eq!(store.current(15.0), Some(1));
        assert_eq!(store.future_len(), 1);

        assert_eq!(store.current(150.0), Some(9));
    }

    #[test]
    fn all_returns_future_then_current() {
        let mut store = SaltStore::new();
        store.replace(
            vec![salt(1, 10.0, 20.0), salt(2, 20.0, 30.0), salt(3, 30.0, 40.0)],
            12.0,
        );

        let salts = store.all(12.0);
        assert_eq!(salts.len(), 3);
        // Future salts sorted by valid_since descending, current last.
        assert_eq!(salts[0].salt, 3);
        assert_eq!(salts[1].salt, 2);
        assert_eq!(salts[2].salt, 1);
    }
}
