//! Push reception subsystem.
//!
//! # Data Flow
//! ```text
//! PushChannelDescriptor
//!     → channel.rs (supervisor: Opening → Open → Failed → Opening ...)
//!     → pull.rs (pull request on a registry transport, push promise events)
//!     → handler.rs (accumulate pushed body, submit to cache)
//! ```
//!
//! # Design Decisions
//! - Channel-level failures always lead to a reopen after backoff
//! - Per-push failures are logged and dropped; they never affect the channel

pub mod channel;
pub mod handler;
pub mod pull;
pub mod types;

pub use channel::{PushChannel, PushChannelHandle};
pub use pull::H2PullOpener;
pub use handler::{PushOutcome, PushPromiseHandler};
pub use types::{
    ChannelEvent, ChannelEvents, ChannelState, PullOpener, PushChannelDescriptor, PushError,
    PushedResource, Termination,
};
