//! Transport subsystem.
//!
//! # Data Flow
//! ```text
//! acquire(transport URL)
//!     → types.rs (scheme check: ws | wss | tcp, else error)
//!     → registry.rs (reuse writable connection?)
//!     → connector.rs (open byte stream)
//!         → websocket.rs (ws/wss: "h2" sub-protocol, binary frames as bytes)
//!         → TcpStream (tcp)
//!     → h2 client handshake
//!     → connection.rs (driver task, writability flag)
//! ```
//!
//! Connection States:
//!     Connecting → Writable → Closed (replaced on next acquire)

pub mod connection;
pub mod connector;
pub mod registry;
pub mod types;
pub mod websocket;

pub use connection::{ConnectionId, TransportConnection};
pub use connector::{BoxedIo, Connector, DefaultConnector, TransportIo};
pub use registry::TransportRegistry;
pub use types::{parse_transport_url, TransportError, TransportScheme};
