//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! transport / push / orchestrator
//!     → logging.rs (structured tracing events, debug switch)
//!     → metrics.rs (counters and gauges)
//!
//! Consumers:
//!     → stdout (tracing-subscriber fmt layer)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Logging never fails the caller
//! - Metric updates are fire-and-forget; without an installed recorder they are no-ops

pub mod logging;
pub mod metrics;

pub use logging::DebugFlag;
