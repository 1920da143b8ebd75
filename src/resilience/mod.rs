//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Pull channel terminated (error / finish)
//!     → backoff.rs (consecutive failures → delay)
//!     → sleep
//!     → reopen with the same descriptor
//! ```
//!
//! # Design Decisions
//! - Reconnects are unbounded in count but never immediate back-to-back storms
//! - A successful open resets the failure count
//! - Jitter keeps many channels on one transport from reconnecting in lockstep

pub mod backoff;

pub use backoff::{calculate_backoff, ReconnectBackoff};
