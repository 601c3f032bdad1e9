//! Polling loop for hostwatch
//!
//! This crate provides:
//! - A startup baseline snapshot (pre-existing entries are never reported)
//! - A fixed-interval poll cycle: snapshot, diff, append every event
//! - Cycle skipping when the watched root cannot be enumerated

pub mod error;
pub mod poller;

// Re-exports
pub use error::PollError;
pub use poller::{CycleOutcome, Poller};
