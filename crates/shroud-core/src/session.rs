//! Per-session admission state.
//!
//! [`SessionState`] owns the duplicate window, the clock-skew estimate, the
//! outbound id generator, and the salt store for one transport session. The
//! transport layer consults it on every decrypted inbound frame
//! ([`admit_inbound`]) and before every outbound send
//! ([`mint_outbound_id`], [`current_salt`]).
//!
//! This is single-owner state: methods take `&mut self`, no internal
//! locking, and every operation completes synchronously. Drivers running
//! multiple sessions keep one `SessionState` per session and serialize
//! access to each.
//!
//! [`admit_inbound`]: SessionState::admit_inbound
//! [`mint_outbound_id`]: SessionState::mint_outbound_id
//! [`current_salt`]: SessionState::current_salt

use crate::{
    clock::ServerTimeEstimate,
    env::Environment,
    error::AdmitError,
    msg_id::{self, MessageIdGenerator, MsgIdWindows},
    replay::{DuplicateWindow, DEFAULT_WINDOW_CAPACITY},
    salt::{SaltStore, ServerSalt},
};

/// Key material facts supplied by the key-negotiation layer.
///
/// The core never sees key bytes; it only consumes these facts for the
/// readiness and admission decisions.
pub trait KeyState {
    /// True once the long-lived main auth key has been negotiated.
    fn has_main_key(&self) -> bool;

    /// True while a temporary (PFS) key exists and is valid at `now`.
    fn has_temp_key(&self, now: f64) -> bool;

    /// Whether this session runs in perfect-forward-secrecy mode.
    fn use_pfs(&self) -> bool;

    /// This session's identifier.
    fn session_id(&self) -> u64;
}

/// Session configuration.
///
/// Defaults carry the protocol values; tests shrink the window capacity to
/// exercise eviction cheaply.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How many admitted inbound ids the duplicate window remembers.
    pub window_capacity: usize,
    /// Time-plausibility windows for message ids.
    pub msg_id_windows: MsgIdWindows,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            window_capacity: DEFAULT_WINDOW_CAPACITY,
            msg_id_windows: MsgIdWindows::default(),
        }
    }
}

/// Protocol state for one encrypted transport session.
pub struct SessionState {
    config: SessionConfig,
    window: DuplicateWindow,
    clock: ServerTimeEstimate,
    generator: MessageIdGenerator,
    salts: SaltStore,
}

impl SessionState {
    /// Create a fresh session with the given configuration.
    pub fn new(config: SessionConfig) -> Self {
        let window = DuplicateWindow::new(config.window_capacity);
        Self {
            config,
            window,
            clock: ServerTimeEstimate::new(),
            generator: MessageIdGenerator::new(),
            salts: SaltStore::new(),
        }
    }

    /// Restore a session from persisted state.
    ///
    /// The duplicate window always starts empty: persisting it would tie the
    /// store format to the window container, and the time-plausibility check
    /// already rejects anything old enough to have been forgotten across a
    /// restart.
    pub fn restore(
        config: SessionConfig,
        server_time_difference: f64,
        last_message_id: i64,
        salts: Vec<ServerSalt>,
        now: f64,
    ) -> Self {
        let clock = ServerTimeEstimate::with_difference(server_time_difference);
        let mut store = SaltStore::new();
        store.replace(salts, clock.server_time(now));
        Self {
            window: DuplicateWindow::new(config.window_capacity),
            config,
            clock,
            generator: MessageIdGenerator::with_last_id(last_message_id),
            salts: store,
        }
    }

    /// True when the session can encrypt and send application traffic.
    ///
    /// Requires a main key, a temporary key when PFS is on, and an
    /// unexpired server salt. Each failing condition is logged separately so
    /// a stuck session is diagnosable from the debug log alone.
    pub fn is_ready(&mut self, keys: &impl KeyState, now: f64) -> bool {
        if !keys.has_main_key() {
            tracing::debug!("session not ready: no main auth key");
            return false;
        }
        if keys.use_pfs() && !keys.has_temp_key(now) {
            tracing::debug!("session not ready: no temporary auth key");
            return false;
        }
        if !self.has_valid_salt(now) {
            tracing::debug!("session not ready: no valid server salt");
            return false;
        }
        true
    }

    /// Admission check for a decrypted inbound frame.
    ///
    /// On success, returns whether this frame moved the clock-skew estimate.
    ///
    /// The order of checks is part of the contract: session identity and
    /// parity are structural and run before the frame can consume window
    /// capacity, and the window runs before the time-plausibility check so a
    /// replayed-but-old id reports as a replay, not a time-window violation.
    ///
    /// # Errors
    ///
    /// See [`AdmitError`]; every variant is a drop-this-frame rejection.
    pub fn admit_inbound(
        &mut self,
        keys: &impl KeyState,
        session_id: u64,
        message_id: i64,
        now: f64,
    ) -> Result<bool, AdmitError> {
        let expected = keys.session_id();
        if session_id != expected {
            return Err(AdmitError::WrongSession { expected, got: session_id });
        }

        // Server-to-client ids are odd; client-to-server ids are even.
        if message_id & 1 == 0 {
            return Err(AdmitError::BadParity { message_id });
        }

        self.window.check(message_id)?;

        // The id's high half is server unix seconds at mint time, so it
        // doubles as a clock sample.
        let candidate = f64::from((message_id >> 32) as u32) - now;
        let synced = self.clock.was_updated();
        let time_updated = self.clock.update(candidate);

        // Until a skew estimate exists, every timestamp would be judged
        // against an unsynchronized clock, so the window is not enforced.
        if synced
            && !msg_id::is_valid_inbound(
                message_id,
                self.clock.server_time(now),
                &self.config.msg_id_windows,
            )
        {
            return Err(AdmitError::StaleOrFutureId { message_id });
        }

        Ok(time_updated)
    }

    /// Mint the next outbound message id.
    pub fn mint_outbound_id(&mut self, env: &impl Environment, now: f64) -> i64 {
        let server_time = self.clock.server_time(now);
        self.generator.mint(env, server_time)
    }

    /// Self-check that an id we are about to send still looks fresh.
    #[must_use]
    pub fn is_valid_outbound_id(&self, id: i64, now: f64) -> bool {
        msg_id::is_valid_outbound(id, self.clock.server_time(now), &self.config.msg_id_windows)
    }

    /// Time-plausibility check for a received id, without admission side
    /// effects.
    #[must_use]
    pub fn is_valid_inbound_id(&self, id: i64, now: f64) -> bool {
        msg_id::is_valid_inbound(id, self.clock.server_time(now), &self.config.msg_id_windows)
    }

    /// The most recently minted outbound id, for persistence.
    #[must_use]
    pub fn last_message_id(&self) -> i64 {
        self.generator.last_id()
    }

    /// Convert a local timestamp to estimated server time.
    #[must_use]
    pub fn get_server_time(&self, now: f64) -> f64 {
        self.clock.server_time(now)
    }

    /// The current server-minus-local offset estimate, for persistence.
    #[must_use]
    pub fn server_time_difference(&self) -> f64 {
        self.clock.difference()
    }

    /// Feed the clock-skew ratchet from an out-of-band source, e.g. the
    /// server-time field of a session-service message. Returns whether the
    /// estimate moved.
    pub fn update_server_time_difference(&mut self, diff: f64) -> bool {
        self.clock.update(diff)
    }

    /// Install a fresh batch of server-provided future salts.
    pub fn replace_future_salts(&mut self, salts: Vec<ServerSalt>, now: f64) {
        let server_time = self.clock.server_time(now);
        self.salts.replace(salts, server_time);
    }

    /// The salt to mix into the next outbound message, if one is known.
    pub fn current_salt(&mut self, now: f64) -> Option<i64> {
        let server_time = self.clock.server_time(now);
        self.salts.current(server_time)
    }

    /// True while an unexpired salt is available.
    pub fn has_valid_salt(&mut self, now: f64) -> bool {
        let server_time = self.clock.server_time(now);
        self.salts.has_valid(server_time)
    }

    /// Every salt this session knows, for persistence.
    pub fn all_salts(&mut self, now: f64) -> Vec<ServerSalt> {
        let server_time = self.clock.server_time(now);
        self.salts.all(server_time)
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}
