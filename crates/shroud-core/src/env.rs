//! Environment abstraction for deterministic testing.
//!
//! The `Environment` trait decouples session logic from system resources
//! (wall clock, secure randomness). Session state machines never read the
//! clock themselves - time arrives as a `now` parameter on each operation,
//! and the trait's `now()` exists for the driver code that supplies it.
//! Randomness is drawn through the trait so that tests can substitute a
//! seeded source and reproduce any minted id sequence exactly.
//!
//! The environment is implemented twice:
//!
//! 1. [`SystemEnv`] (this crate): real wall clock and OS entropy, for
//!    production drivers.
//! 2. `SimEnv` (shroud-harness): manually advanced virtual clock and a
//!    ChaCha20 RNG with a fixed seed, for deterministic tests.
//!
//! # Invariants
//!
//! - Determinism: given the same seed, `random_bytes()` produces the same
//!   sequence
//! - RNG quality: production implementations must use cryptographically
//!   secure entropy; message-id jitter and salt handling assume an attacker
//!   cannot predict the stream

/// Abstract environment providing wall-clock time and secure randomness.
///
/// # Implementations
///
/// - Production ([`SystemEnv`]): `SystemTime` and the OS entropy pool via
///   `getrandom`.
/// - Simulation (`shroud-harness::SimEnv`): virtual clock that tests advance
///   explicitly, seeded RNG for reproducibility.
pub trait Environment: Clone + Send + Sync + 'static {
    /// Returns the current wall-clock time in unix seconds.
    ///
    /// Driver code reads this once per event and passes the value into the
    /// session operations that need it; the core never calls `now()` behind
    /// the caller's back.
    fn now(&self) -> f64;

    /// Fills the provided buffer with random bytes.
    ///
    /// # Panics
    ///
    /// May panic if the OS entropy pool is unavailable (extremely rare) or
    /// if a simulation environment is used outside its harness.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Generates a random `u32`.
    ///
    /// Used for message-id jitter, where only 32 bits are consumed per mint.
    fn random_u32(&self) -> u32 {
        let mut bytes = [0u8; 4];
        self.random_bytes(&mut bytes);
        u32::from_be_bytes(bytes)
    }

    /// Generates a random `u64`.
    ///
    /// Convenience for callers assigning session ids.
    fn random_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        self.random_bytes(&mut bytes);
        u64::from_be_bytes(bytes)
    }

    /// Generates a random `i64`, e.g. for locally invented salt values.
    fn random_i64(&self) -> i64 {
        let mut bytes = [0u8; 8];
        self.random_bytes(&mut bytes);
        i64::from_be_bytes(bytes)
    }
}

/// Production environment backed by the system clock and OS entropy.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    fn now(&self) -> f64 {
        // A clock set before the unix epoch reads as zero rather than
        // panicking; admission then behaves as "never synced".
        std::time::UNIX_EPOCH.elapsed().map(|d| d.as_secs_f64()).unwrap_or(0.0)
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::getrandom(buffer).expect("OS entropy source unavailable");
    }
}
