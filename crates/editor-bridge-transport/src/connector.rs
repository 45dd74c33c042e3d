//! Transport seam.
//!
//! A [`Connector`] opens a [`Link`]: a pair of channels carrying encoded
//! frames out and [`TransportEvent`]s in. Framing and sockets stay behind it.

use std::time::Duration;

use async_trait::async_trait;
use editor_bridge_core::{ConfigError, ConnectionConfig};
use thiserror::Error;
use tokio::sync::mpsc;

/// Event delivered by an open transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// One text frame.
    Frame(String),
    /// One binary frame, expected to hold UTF-8 JSON.
    Binary(Vec<u8>),
    /// The peer closed the transport or it failed.
    Closed { reason: Option<String> },
}

/// An open transport.
#[derive(Debug)]
pub struct Link {
    /// Encoded outbound frames. Dropping it closes the transport.
    pub outbound: mpsc::UnboundedSender<String>,
    /// Inbound events, in arrival order.
    pub inbound: mpsc::UnboundedReceiver<TransportEvent>,
}

/// Connection error.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
    #[error("Server {authority} unreachable: {reason}")]
    Unreachable { authority: String, reason: String },
    #[error("Connecting to {authority} timed out after {after:?}")]
    TimedOut { authority: String, after: Duration },
    #[error("Not connected")]
    NotConnected,
    #[error("Failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Trait for transport backends.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Open a transport to the configured server.
    async fn connect(&self, config: &ConnectionConfig) -> Result<Link, ConnectionError>;
}
