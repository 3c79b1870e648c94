//! Chaos tests for the session admission path.
//!
//! Arbitrary interleavings of inbound admission, outbound minting, and salt
//! replacement must never panic, and the cross-component invariants must
//! survive: an admitted id is immediately a duplicate, and outbound ids keep
//! climbing no matter what the inbound side is doing.

use std::sync::{Arc, Mutex};

use proptest::prelude::*;
use shroud_core::{
    env::Environment,
    error::{AdmitError, ReplayError},
    salt::ServerSalt,
    session::{KeyState, SessionConfig, SessionState},
};

const SESSION_ID: u64 = 42;

struct Keys;

impl KeyState for Keys {
    fn has_main_key(&self) -> bool {
        true
    }

    fn has_temp_key(&self, _now: f64) -> bool {
        true
    }

    fn use_pfs(&self) -> bool {
        false
    }

    fn session_id(&self) -> u64 {
        SESSION_ID
    }
}

#[derive(Clone)]
struct PatternEnv {
    counter: Arc<Mutex<u8>>,
}

impl PatternEnv {
    fn new() -> Self {
        Self { counter: Arc::new(Mutex::new(0)) }
    }
}

impl Environment for PatternEnv {
    fn now(&self) -> f64 {
        0.0
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        let mut counter = self.counter.lock().unwrap();
        for byte in buffer.iter_mut() {
            *counter = counter.wrapping_mul(31).wrapping_add(7);
            *byte = *counter;
        }
    }
}

/// One step of the chaos interleaving.
#[derive(Debug, Clone)]
enum Op {
    Admit { session_id: u64, message_id: i64, now: f64 },
    Mint { now: f64 },
    ReplaceSalts { salts: Vec<(i64, f64, f64)>, now: f64 },
    CheckReady { now: f64 },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let now = -1_000_000_000.0f64..4_000_000_000.0;
    prop_oneof![
        (any::<u64>(), any::<i64>(), now.clone())
            .prop_map(|(session_id, message_id, now)| Op::Admit { session_id, message_id, now }),
        now.clone().prop_map(|now| Op::Mint { now }),
        (
            prop::collection::vec(
                (any::<i64>(), 0.0f64..4_000_000_000.0, 0.0f64..4_000_000_000.0),
                0..8
            ),
            now.clone()
        )
            .prop_map(|(salts, now)| Op::ReplaceSalts { salts, now }),
        now.prop_map(|now| Op::CheckReady { now }),
    ]
}

#[test]
fn prop_chaos_interleaving_never_panics() {
    proptest!(|(ops in prop::collection::vec(op_strategy(), 0..120))| {
        let keys = Keys;
        let env = PatternEnv::new();
        let mut session = SessionState::new(SessionConfig {
            window_capacity: 16,
            ..SessionConfig::default()
        });

        let mut last_minted = 0i64;

        for op in ops {
            match op {
                Op::Admit { session_id, message_id, now } => {
                    let result = session.admit_inbound(&keys, session_id, message_id, now);

                    if session_id != SESSION_ID {
                        let is_wrong_session =
                            matches!(result, Err(AdmitError::WrongSession { .. }));
                        prop_assert!(is_wrong_session);
                    } else if message_id & 1 == 0 {
                        let is_bad_parity = matches!(result, Err(AdmitError::BadParity { .. }));
                        prop_assert!(is_bad_parity);
                    } else if result.is_ok() {
                        // Whatever was admitted must be a literal duplicate on
                        // the very next try, regardless of clock state: the
                        // window check runs before the time window.
                        prop_assert_eq!(
                            session.admit_inbound(&keys, session_id, message_id, now),
                            Err(AdmitError::Replay(ReplayError::Duplicate {
                                message_id
                            }))
                        );
                    }
                }
                Op::Mint { now } => {
                    // Chaos inputs may push the clock estimate beyond the
                    // fixed-point range, where the generator saturates, so
                    // only non-strict monotonicity is asserted here. The
                    // strict version lives in admission_properties.rs under
                    // in-range server times.
                    let id = session.mint_outbound_id(&env, now);
                    prop_assert!(id >= last_minted);
                    last_minted = id;
                }
                Op::ReplaceSalts { salts, now } => {
                    let salts = salts
                        .into_iter()
                        .map(|(salt, since, until)| ServerSalt {
                            salt,
                            valid_since: since,
                            valid_until: until,
                        })
                        .collect();
                    session.replace_future_salts(salts, now);
                    // Persistence view stays coherent after any batch.
                    let _ = session.all_salts(now);
                }
                Op::CheckReady { now } => {
                    // Readiness must agree with the salt store's own answer.
                    let ready = session.is_ready(&keys, now);
                    prop_assert_eq!(ready, session.has_valid_salt(now));
                }
            }
        }
    });
}
