//! Shroud session-state core
//!
//! This crate contains the pure per-session protocol state for the shroud
//! encrypted RPC transport: replay rejection, clock-skew reconciliation,
//! message-id minting, and server-salt rotation. It is completely decoupled
//! from I/O, enabling deterministic testing.
//!
//! # Architecture
//!
//! Session logic is strictly separated from transport concerns:
//!
//! ```text
//!      ┌────────────────────────────┐
//!      │ shroud-core                │
//!      │ - Admission policy         │
//!      │ - Message-id generation    │
//!      │ - Salt rotation            │
//!      └────────────────────────────┘
//!         ↓                      ↓
//! ┌────────────────┐  ┌────────────────┐
//! │ shroud-harness │  │ transport layer│
//! │ - Virtual time │  │ - Real network │
//! │ - Seeded RNG   │  │ - System clock │
//! └────────────────┘  └────────────────┘
//! ```
//!
//! # Key Principles
//!
//! - No I/O in the core: never read the system clock or system entropy
//!   directly; time arrives as a parameter, randomness through the
//!   [`env::Environment`] trait
//! - Deterministic: given the same inputs and environment state, produce the
//!   same outputs
//! - One owner per session: no internal locking; the caller serializes access
//!   to a [`session::SessionState`]
//!
//! # Modules
//!
//! - [`session`]: per-session admission state (readiness, inbound checks,
//!   outbound id minting)
//! - [`replay`]: bounded window of recently admitted message ids
//! - [`clock`]: server clock-skew estimation
//! - [`msg_id`]: message-id minting and time-window validation
//! - [`salt`]: server salt rotation
//! - [`env`]: environment abstraction (time, RNG)
//! - [`error`]: admission error types

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod clock;
pub mod env;
pub mod error;
pub mod msg_id;
pub mod replay;
pub mod salt;
pub mod session;
