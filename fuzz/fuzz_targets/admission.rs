//! Fuzzer for the session admission path
//!
//! Drives arbitrary interleavings of inbound admission, outbound minting,
//! and salt replacement against one session. Message ids and timestamps mix
//! libFuzzer-chosen raw values with known edge cases (0, parity boundaries,
//! i64 extremes, ids straddling the time-window bounds) so the structured
//! corners get hit even before coverage feedback finds them.
//!
//! Checked on every input:
//! - no operation panics, whatever the peer sends
//! - an id admitted once is a duplicate immediately afterwards

#![no_main]

use std::sync::{Arc, Mutex};

use libfuzzer_sys::fuzz_target;
use shroud_core::{
    env::Environment,
    error::{AdmitError, ReplayError},
    salt::ServerSalt,
    session::{KeyState, SessionConfig, SessionState},
};

const SESSION_ID: u64 = 7;

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
struct CycleEnv {
    state: Arc<Mutex<u64>>,
}

impl Environment for CycleEnv {
    fn now(&self) -> f64 {
        0.0
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        let mut state = self.state.lock().unwrap();
        for byte in buffer.iter_mut() {
            // SplitMix64 step; quality is irrelevant here, determinism is not.
            *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
            let mut z = *state;
            z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
            *byte = (z >> 56) as u8;
        }
    }
}

// Edge-case message ids: parity boundaries, extremes, and ids whose high
// half sits exactly on the admission-window bounds around t = 1000.
const ID_EDGES: &[i64] = &[
    0,
    1,
    2,
    3,
    4,
    7,
    8,
    i64::MIN,
    i64::MIN | 1,
    i64::MAX,
    i64::MAX - 1,
    700 << 32 | 1,
    (700 << 32) - 1,
    701 << 32 | 1,
    1_000 << 32 | 1,
    1_029 << 32 | 1,
    1_030 << 32 | 1,
    (1_030 << 32) | 3,
];

// Edge-case timestamps, including the far-past sentinel region and a clock
// that claims to be deep in the future.
const NOW_EDGES: &[f64] = &[0.0, 1.0, 1_000.0, -1e10, 1.7e9, 4e9, f64::MAX, f64::MIN];

fuzz_target!(|data: &[u8]| {
    let keys = Keys;
    let env = CycleEnv { state: Arc::new(Mutex::new(data.len() as u64)) };
    let mut session = SessionState::new(SessionConfig {
        window_capacity: 8,
        ..SessionConfig::default()
    });

    for chunk in data.chunks_exact(10) {
        let raw_id = i64::from_le_bytes(chunk[1..9].try_into().unwrap());
        let message_id = if chunk[9] & 1 == 0 {
            ID_EDGES[raw_id.unsigned_abs() as usize % ID_EDGES.len()]
        } else {
            raw_id
        };
        let now = NOW_EDGES[(chunk[9] >> 1) as usize % NOW_EDGES.len()];

        match chunk[0] % 4 {
            0 => {
                let result = session.admit_inbound(&keys, SESSION_ID, message_id, now);
                if result.is_ok() {
                    assert_eq!(
                        session.admit_inbound(&keys, SESSION_ID, message_id, now),
                        Err(AdmitError::Replay(ReplayError::Duplicate { message_id }))
                    );
                }
            }
            1 => {
                // Wrong session must never reach the window: the same id
                // stays admissible afterwards if it was before.
                let _ = session.admit_inbound(&keys, SESSION_ID ^ 1, message_id, now);
            }
            2 => {
                let _ = session.mint_outbound_id(&env, now);
                let _ = session.is_valid_outbound_id(message_id, now);
            }
            _ => {
                let salts = vec![ServerSalt {
                    salt: raw_id,
                    valid_since: now,
                    valid_until: now + 60.0,
                }];
                session.replace_future_salts(salts, now);
                let _ = session.has_valid_salt(now);
                let _ = session.all_salts(now);
            }
        }
    }
});
