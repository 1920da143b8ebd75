//! In-flight configuration tracking.
//!
//! # Responsibilities
//! - Count ingestion operations that have started but not finished
//! - Emit `Completed` exactly when the count drops from 1 to 0
//!
//! # Design Decisions
//! - The only way to decrement is dropping a guard, so the count cannot go negative
//! - Increments never notify; the signal is reusable across batches

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::observability::metrics;
use crate::orchestrator::types::ConfigEvent;

/// Tracks in-flight configuration work.
#[derive(Debug, Clone)]
pub struct ActivityTracker {
    active: Arc<AtomicUsize>,
    events: broadcast::Sender<ConfigEvent>,
}

impl ActivityTracker {
    pub fn new(events: broadcast::Sender<ConfigEvent>) -> Self {
        Self {
            active: Arc::new(AtomicUsize::new(0)),
            events,
        }
    }

    /// Record the start of an operation. Dropping the guard records its end.
    pub fn begin(&self) -> ConfiguringGuard {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::record_in_flight(now);
        ConfiguringGuard {
            active: Arc::clone(&self.active),
            events: self.events.clone(),
        }
    }

    pub fn active_count(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub fn is_configuring(&self) -> bool {
        self.active_count() > 0
    }
}

/// One in-flight operation. Decrements the count when dropped.
#[derive(Debug)]
pub struct ConfiguringGuard {
    active: Arc<AtomicUsize>,
    events: broadcast::Sender<ConfigEvent>,
}

impl Drop for ConfiguringGuard {
    fn drop(&mut self) {
        let previous = self.active.fetch_sub(1, Ordering::SeqCst);
        metrics::record_in_flight(previous - 1);
        if previous == 1 {
            tracing::debug!("Configuration completed");
            let _ = self.events.send(ConfigEvent::Completed);
        }
    }
}
