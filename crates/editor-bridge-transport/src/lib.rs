//! Connection lifecycle and wire protocol for the editor bridge.
//!
//! Provides:
//! - Wire protocol (camelCase-tagged JSON)
//! - `Connector` seam with in-memory and WebSocket (feature: websocket) backends
//! - `ConnectionManager` - connect, reconnect, decode and republish

pub mod connection;
pub mod connector;
pub mod memory;
pub mod protocol;

#[cfg(feature = "websocket")]
pub mod websocket;

pub use connection::ConnectionManager;
pub use connector::{ConnectionError, Connector, Link, TransportEvent};
pub use memory::{MemoryConnector, MemoryPeer};
pub use protocol::{ClientMessage, DecodeError};

#[cfg(feature = "websocket")]
pub use websocket::WebSocketConnector;
