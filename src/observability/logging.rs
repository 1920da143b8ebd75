//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Carry the runtime "debug" switch that turns on verbose info lines
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured level when set
//! - The debug switch is sticky: once a descriptor enables it, it stays on

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the global tracing subscriber.
///
/// Safe to call more than once; later calls are ignored.
pub fn init(log_level: &str, debug: bool) {
    let default_filter = if debug {
        "pushcache=debug".to_string()
    } else {
        format!("pushcache={}", log_level)
    };

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Shared verbose-logging switch.
#[derive(Debug, Clone, Default)]
pub struct DebugFlag(Arc<AtomicBool>);

impl DebugFlag {
    pub fn new(enabled: bool) -> Self {
        Self(Arc::new(AtomicBool::new(enabled)))
    }

    /// Turn verbose logging on. There is no way back.
    pub fn enable(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
