//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! ConfigurationDescriptor.url
//!     → origin.rs (scheme://host:resolved-port)
//!     → table.rs (origin → transport URL upsert)
//!
//! Lookup:
//!     origin → table.rs → Some(transport URL) | None
//! ```
//!
//! # Design Decisions
//! - Origins always carry an explicit port so default-port spellings collapse
//! - Only the orchestrator writes routes; everyone else reads

pub mod origin;
pub mod table;

pub use origin::{get_origin, resolve_port};
pub use table::ProxyRoutingTable;
