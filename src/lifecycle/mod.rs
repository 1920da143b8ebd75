//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load settings → Validate → Build Configuration → configure(sources)
//!
//! Shutdown (shutdown.rs):
//!     Signal received (signals.rs) → trigger → push channels stop → exit
//! ```
//!
//! # Design Decisions
//! - Push channels have no per-channel cancellation; only process shutdown stops them

pub mod shutdown;
pub mod signals;

pub use shutdown::{Shutdown, ShutdownSignal};
