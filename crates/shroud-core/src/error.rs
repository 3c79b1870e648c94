//! Error types for message admission.
//!
//! Every variant here is a local rejection, not a fault: the transport layer
//! drops the offending frame and carries on. Nothing in this module (or the
//! rest of the core) panics on malformed peer input.

use thiserror::Error;

/// Rejections produced by the duplicate window.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayError {
    /// Exact replay of an id the window still remembers.
    ///
    /// Expected under network-level retransmission; drop silently.
    #[error("duplicate message_id {message_id}")]
    Duplicate {
        /// The replayed id.
        message_id: i64,
    },

    /// Older than every id a full window remembers.
    ///
    /// Worth logging as suspicious when far outside plausible
    /// retransmission delay.
    #[error("message_id {message_id} is below the replay window floor {oldest}")]
    TooOld {
        /// The rejected id.
        message_id: i64,
        /// The oldest id the window still remembers.
        oldest: i64,
    },
}

/// Rejections produced by the inbound admission check.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmitError {
    /// The frame's session id does not match this session.
    ///
    /// Likely a stale or misrouted connection; surfaced to the caller for a
    /// connection-level decision rather than a per-frame one.
    #[error("packet from different session: expected {expected}, got {got}")]
    WrongSession {
        /// This session's id.
        expected: u64,
        /// The session id carried by the frame.
        got: u64,
    },

    /// The message id has client parity on a server-to-client message.
    ///
    /// Server-minted ids are odd; an even id means a corrupted or malicious
    /// frame.
    #[error("message_id {message_id} has wrong parity for a server message")]
    BadParity {
        /// The rejected id.
        message_id: i64,
    },

    /// The duplicate window rejected the id.
    #[error(transparent)]
    Replay(#[from] ReplayError),

    /// The id fails the time-plausibility window despite not being a literal
    /// duplicate.
    ///
    /// Only enforced once a clock-skew estimate exists, so that traffic is
    /// not rejected wholesale before first sync.
    #[error("message_id {message_id} is outside the accepted time window")]
    StaleOrFutureId {
        /// The rejected id.
        message_id: i64,
    },
}

impl AdmitError {
    /// Returns true if this rejection indicates the connection itself is
    /// suspect, rather than one bad frame.
    ///
    /// Duplicates, stale ids, and parity failures are per-frame conditions;
    /// a session-id mismatch means frames are arriving on the wrong session
    /// and the caller should consider resetting the connection.
    pub fn is_session_fatal(&self) -> bool {
        matches!(self, AdmitError::WrongSession { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_wrong_session_is_session_fatal() {
        assert!(AdmitError::WrongSession { expected: 1, got: 2 }.is_session_fatal());

        assert!(!AdmitError::BadParity { message_id: 8 }.is_session_fatal());
        assert!(
            !AdmitError::Replay(ReplayError::Duplicate { message_id: 7 }).is_session_fatal()
        );
        assert!(
            !AdmitError::Replay(ReplayError::TooOld { message_id: 1, oldest: 9 })
                .is_session_fatal()
        );
        assert!(!AdmitError::StaleOrFutureId { message_id: 7 }.is_session_fatal());
    }

    #[test]
    fn replay_errors_convert_transparently() {
        let err: AdmitError = ReplayError::Duplicate { message_id: 7 }.into();
        assert_eq!(err, AdmitError::Replay(ReplayError::Duplicate { message_id: 7 }));
        assert_eq!(err.to_string(), "duplicate message_id 7");
    }
}
