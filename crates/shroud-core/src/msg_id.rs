//! Message-id minting and time-window validation.
//!
//! A message id is a signed 64-bit fixed-point encoding of server time with
//! 32 fractional bits: the high half is approximately unix seconds, the low
//! half sub-second resolution plus per-client jitter. The two lowest bits
//! carry direction/kind information at the protocol layer and are always
//! zero on freshly minted ids.

use crate::env::Environment;

/// One second expressed in message-id fixed point (32 fractional bits).
const ID_SECOND: i64 = 1 << 32;

/// Low bits randomized when minting, to decorrelate clients whose clocks
/// have coarse resolution.
const JITTER_MASK: u32 = (1 << 22) - 1;

/// Time-plausibility windows around server time, in seconds.
///
/// The defaults are the protocol tolerances: inbound ids may lag up to 300 s
/// and lead up to 30 s; outbound ids are held to the tighter -150 s/+30 s
/// self-check so that anything we send still looks fresh after transit.
/// Kept as configuration rather than literals to ease future tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct MsgIdWindows {
    /// How far behind server time an outbound id may be.
    pub outbound_past: f64,
    /// How far ahead of server time an outbound id may be.
    pub outbound_future: f64,
    /// How far behind server time an inbound id may be.
    pub inbound_past: f64,
    /// How far ahead of server time an inbound id may be.
    pub inbound_future: f64,
}

impl Default for MsgIdWindows {
    fn default() -> Self {
        Self {
            outbound_past: 150.0,
            outbound_future: 30.0,
            inbound_past: 300.0,
            inbound_future: 30.0,
        }
    }
}

/// Approximate unix time carried in a message id.
///
/// Truncating division discards the fractional and jitter bits.
#[must_use]
pub fn id_timestamp(id: i64) -> f64 {
    (id / ID_SECOND) as f64
}

/// True if an id we are about to send looks fresh enough to the peer.
#[must_use]
pub fn is_valid_outbound(id: i64, server_time: f64, windows: &MsgIdWindows) -> bool {
    let id_time = id_timestamp(id);
    server_time - windows.outbound_past < id_time
        && id_time < server_time + windows.outbound_future
}

/// True if a received id is neither replay-old nor implausibly far in the
/// future.
#[must_use]
pub fn is_valid_inbound(id: i64, server_time: f64, windows: &MsgIdWindows) -> bool {
    let id_time = id_timestamp(id);
    server_time - windows.inbound_past < id_time && id_time < server_time + windows.inbound_future
}

/// Mints collision-free, strictly increasing outbound message ids.
///
/// # Invariants
///
/// - Every minted id is strictly greater than the previous one
/// - Every minted id is a multiple of 4
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageIdGenerator {
    last_id: i64,
}

impl MessageIdGenerator {
    /// A generator that has minted nothing yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a generator from a persisted high-water mark.
    pub fn with_last_id(last_id: i64) -> Self {
        Self { last_id }
    }

    /// The most recently minted id, or zero if none.
    #[must_use]
    pub fn last_id(&self) -> i64 {
        self.last_id
    }

    /// Mint the next outbound id for the given server time.
    ///
    /// The id starts as fixed-point server time, gets its low 22 bits
    /// XOR-randomized (clocks with coarse resolution would otherwise mint
    /// identical ids across clients), and has its two lowest bits cleared.
    /// When the clock has not advanced enough to beat the previous id, the
    /// generator steps forward by a randomized multiple of 8 instead, which
    /// keeps the sequence strictly increasing without becoming predictable.
    pub fn mint(&mut self, env: &impl Environment, server_time: f64) -> i64 {
        let mut t = (server_time * ID_SECOND as f64) as i64;

        let r = env.random_u32();
        t ^= i64::from(r & JITTER_MASK);

        let mut id = t & !3;
        if id <= self.last_id {
            let stride = i64::from(((r >> 22) & 1023) + 1);
            // Saturate rather than wrap at the top of the id space; a peer
            // that drags the clock estimate that far forward must not be
            // able to panic the generator.
            id = self.last_id.saturating_add(8 * stride);
        }

        self.last_id = id;
        id
    }
}
