//! Identity and lifecycle state shared by every component.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of one running editor-window process.
///
/// Supplied by the host at startup and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Wrap a host-provided identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Transport lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No transport is open.
    #[default]
    Disconnected,
    /// A connect attempt is in flight.
    Connecting,
    /// Frames are flowing.
    Connected,
}

/// Whether this window is the authoritative one for its remote session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationState {
    /// Another window (or nobody) was announced last.
    #[default]
    Inactive,
    /// This window was announced last.
    Active,
}

/// Local notification published whenever the connection state changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionStateChanged {
    /// New state.
    pub state: ConnectionState,
    /// Human-readable cause for a transition to `Disconnected`.
    pub reason: Option<String>,
}

impl ConnectionStateChanged {
    #[must_use]
    pub const fn new(state: ConnectionState) -> Self {
        Self {
            state,
            reason: None,
        }
    }

    #[must_use]
    pub fn disconnected(reason: impl Into<String>) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            reason: Some(reason.into()),
        }
    }
}

/// Window focus notification from the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowState {
    pub focused: bool,
}
