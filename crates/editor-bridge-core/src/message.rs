//! Message catalog.
//!
//! The closed set of payloads exchanged with the session server. Each payload
//! is its own type so it can travel on its own [`EventBus`] channel.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{EventBus, SessionId};

/// Open a new terminal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTerminal {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shell_args: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shell_path: Option<String>,
    #[serde(default)]
    pub preserve_focus: bool,
}

/// Type a command line into the active terminal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteTerminalCommand {
    #[serde(default)]
    pub command: String,
}

/// Run an editor command.
///
/// The server usually sends `arguments` as JSON text, which is only parsed at
/// the point of execution. Any JSON value is accepted so a frame is never
/// rejected over its arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteCommand {
    #[serde(default)]
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Value>,
}

/// Change the language of the active document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeLanguage {
    #[serde(default)]
    pub language_id: String,
}

/// Insert a named snippet at the cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertSnippet {
    #[serde(default)]
    pub name: String,
}

/// Announcement that `session_id` is now the authoritative window.
///
/// Travels in both directions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveSessionChanged {
    pub session_id: SessionId,
}

/// Discriminant of [`Message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    CreateTerminal,
    ExecuteTerminalCommand,
    ExecuteCommand,
    ChangeLanguage,
    InsertSnippet,
    ActiveSessionChanged,
}

impl MessageKind {
    pub const ALL: [Self; 6] = [
        Self::CreateTerminal,
        Self::ExecuteTerminalCommand,
        Self::ExecuteCommand,
        Self::ChangeLanguage,
        Self::InsertSnippet,
        Self::ActiveSessionChanged,
    ];

    /// Value of the `type` field on the wire.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::CreateTerminal => "createTerminal",
            Self::ExecuteTerminalCommand => "executeTerminalCommand",
            Self::ExecuteCommand => "executeCommand",
            Self::ChangeLanguage => "changeLanguage",
            Self::InsertSnippet => "insertSnippet",
            Self::ActiveSessionChanged => "activeSessionChanged",
        }
    }

    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }
}

/// Any catalog message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Message {
    CreateTerminal(CreateTerminal),
    ExecuteTerminalCommand(ExecuteTerminalCommand),
    ExecuteCommand(ExecuteCommand),
    ChangeLanguage(ChangeLanguage),
    InsertSnippet(InsertSnippet),
    ActiveSessionChanged(ActiveSessionChanged),
}

impl Message {
    #[must_use]
    pub const fn kind(&self) -> MessageKind {
        match self {
            Self::CreateTerminal(_) => MessageKind::CreateTerminal,
            Self::ExecuteTerminalCommand(_) => MessageKind::ExecuteTerminalCommand,
            Self::ExecuteCommand(_) => MessageKind::ExecuteCommand,
            Self::ChangeLanguage(_) => MessageKind::ChangeLanguage,
            Self::InsertSnippet(_) => MessageKind::InsertSnippet,
            Self::ActiveSessionChanged(_) => MessageKind::ActiveSessionChanged,
        }
    }

    /// Publish the payload on the channel of its own type.
    ///
    /// Returns the number of handlers invoked.
    pub fn publish(&self, bus: &EventBus) -> usize {
        match self {
            Self::CreateTerminal(m) => bus.publish(m),
            Self::ExecuteTerminalCommand(m) => bus.publish(m),
            Self::ExecuteCommand(m) => bus.publish(m),
            Self::ChangeLanguage(m) => bus.publish(m),
            Self::InsertSnippet(m) => bus.publish(m),
            Self::ActiveSessionChanged(m) => bus.publish(m),
        }
    }
}

macro_rules! impl_from_payload {
    ($($payload:ident),* $(,)?) => {
        $(
            impl From<$payload> for Message {
                fn from(payload: $payload) -> Self {
                    Self::$payload(payload)
                }
            }
        )*
    };
}

impl_from_payload!(
    CreateTerminal,
    ExecuteTerminalCommand,
    ExecuteCommand,
    ChangeLanguage,
    InsertSnippet,
    ActiveSessionChanged,
);
