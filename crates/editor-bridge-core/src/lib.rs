//! Core abstractions for bridging a remote session server to an editor.
//!
//! This crate provides the fundamental building blocks:
//! - `EventBus` - Typed synchronous publish/subscribe
//! - `Message` - The message catalog exchanged with the server
//! - `ConnectionConfig` - Where the server lives
//! - Host collaborator traits (terminals, commands, documents, snippets, status)

pub mod bus;
pub mod config;
pub mod message;
pub mod state;
pub mod traits;

pub use bus::{EventBus, Subscription};
pub use config::{ConfigError, ConnectionConfig};
pub use message::{
    ActiveSessionChanged, ChangeLanguage, CreateTerminal, ExecuteCommand, ExecuteTerminalCommand,
    InsertSnippet, Message, MessageKind,
};
pub use state::{ActivationState, ConnectionState, ConnectionStateChanged, SessionId, WindowState};
pub use traits::{
    CommandHost, DocumentHandle, DocumentHost, HostCommand, HostError, SnippetHost,
    StatusIndicator, StatusSurface, TerminalHandle, TerminalHost, TerminalOptions,
};
