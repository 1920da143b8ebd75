//! Configuration subsystem.
//!
//! # Data Flow
//! ```text
//! settings file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → RuntimeConfig
//!
//! descriptor JSON (inline or fetched by fetch.rs)
//!     → descriptor.rs
//!     → orchestrator
//!
//! On file change:
//!     watcher.rs detects change
//!     → debounced, loader.rs reloads and validates
//!     → SettingsUpdate (changed backoff, new sources) sent to the main loop
//! ```
//!
//! # Design Decisions
//! - All settings fields have defaults to allow minimal files
//! - Validation separates syntactic (serde) from semantic checks

pub mod descriptor;
pub mod fetch;
pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use descriptor::{ConfigurationDescriptor, ProxyOptions};
pub use fetch::{ConfigFetcher, HttpFetcher};
pub use loader::{load_config, LoadError};
pub use schema::{FetchSettings, ObservabilityConfig, PushSettings, RuntimeConfig};
pub use watcher::{ConfigWatcher, SettingsUpdate};
