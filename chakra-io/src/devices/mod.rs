//! Device implementations
//!
//! Real robots are reached through their own link crates; this module only
//! ships the hardware-free simulation.

#[cfg(feature = "mock")]
pub mod mock;
