//! Configuration orchestration.
//!
//! # Data Flow
//! ```text
//! configure([url | descriptor, ...])
//!     → url:        fetch (background) → parse → add_config
//!     → descriptor: add_config
//!
//! add_config
//!     → routes.set_route(origin, transport)
//!     → push path?  → PushChannel::spawn
//!
//! every operation holds a ConfiguringGuard;
//! the last guard dropped broadcasts ConfigEvent::Completed
//! ```

pub mod configuration;
pub mod tracker;
pub mod types;

pub use configuration::{Configuration, ConfigurationBuilder};
pub use tracker::{ActivityTracker, ConfiguringGuard};
pub use types::{ConfigError, ConfigEvent, ConfigSource};
