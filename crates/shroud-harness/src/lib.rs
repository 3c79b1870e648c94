//! Deterministic simulation harness for shroud session-state testing.
//!
//! This crate provides a virtual-clock, seeded-RNG implementation of the
//! `Environment` trait, enabling reproducible testing of admission, minting,
//! and salt-rotation behavior. Integration tests that drive a whole session
//! the way a transport layer would live in this crate's `tests/` directory.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod sim_env;

pub use sim_env::SimEnv;
