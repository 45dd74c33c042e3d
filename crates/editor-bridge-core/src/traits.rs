//! Host collaborator traits.
//!
//! The bridge never touches editor internals directly. The host integration
//! implements these traits and hands them to the controller.

use std::{collections::BTreeMap, path::PathBuf};

use serde_json::Value;
use thiserror::Error;

use crate::CreateTerminal;

/// Opaque terminal handle issued by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TerminalHandle(pub u64);

/// Opaque document handle issued by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentHandle(pub u64);

/// Everything needed to open a terminal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TerminalOptions {
    pub name: Option<String>,
    pub working_directory: Option<PathBuf>,
    pub environment: BTreeMap<String, String>,
    pub shell_args: Vec<String>,
    pub shell_path: Option<PathBuf>,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Blank names and paths from the wire count as unset.
impl From<&CreateTerminal> for TerminalOptions {
    fn from(request: &CreateTerminal) -> Self {
        Self {
            name: non_empty(request.name.as_deref()).map(str::to_string),
            working_directory: non_empty(request.working_directory.as_deref()).map(Into::into),
            environment: request.environment.clone().unwrap_or_default(),
            shell_args: request.shell_args.clone().unwrap_or_default(),
            shell_path: non_empty(request.shell_path.as_deref()).map(Into::into),
        }
    }
}

/// Error returned by a host primitive.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Terminal not found: {0:?}")]
    TerminalNotFound(TerminalHandle),
    #[error("Document not found: {0:?}")]
    DocumentNotFound(DocumentHandle),
    #[error("Command failed: {0}")]
    CommandFailed(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Terminal primitives.
pub trait TerminalHost: Send + Sync {
    /// Open a new terminal.
    ///
    /// # Errors
    /// Returns error if the terminal could not be created.
    fn create(&self, options: &TerminalOptions) -> Result<TerminalHandle, HostError>;

    /// Bring a terminal to the foreground.
    ///
    /// # Errors
    /// Returns error if the handle is unknown.
    fn show(&self, terminal: TerminalHandle, preserve_focus: bool) -> Result<(), HostError>;

    /// Type text into a terminal, followed by a newline.
    ///
    /// # Errors
    /// Returns error if the handle is unknown or the write fails.
    fn send_text(&self, terminal: TerminalHandle, text: &str) -> Result<(), HostError>;

    /// The terminal that currently has focus, if any.
    fn active_terminal(&self) -> Option<TerminalHandle>;

    /// Release a terminal. Unknown handles are ignored.
    fn dispose(&self, terminal: TerminalHandle);
}

/// Editor command registry.
pub trait CommandHost: Send + Sync {
    /// Run `command`, with structured arguments when present.
    ///
    /// # Errors
    /// Returns error if the command is unknown or fails.
    fn execute(&self, command: &str, arguments: Option<Value>) -> Result<(), HostError>;
}

/// Document language primitives.
pub trait DocumentHost: Send + Sync {
    /// The document in the focused editor, if any.
    fn active_document(&self) -> Option<DocumentHandle>;

    /// Reassign a document's language.
    ///
    /// # Errors
    /// Returns error if the handle is unknown or the language is rejected.
    fn set_language(&self, document: DocumentHandle, language_id: &str) -> Result<(), HostError>;
}

/// Snippet primitive.
pub trait SnippetHost: Send + Sync {
    /// Insert the named snippet at the cursor.
    ///
    /// # Errors
    /// Returns error if the snippet cannot be inserted.
    fn insert_snippet(&self, name: &str) -> Result<(), HostError>;
}

/// Host command a status indicator can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostCommand {
    /// Tear down and reopen the connection.
    Reconnect,
    /// Announce this window as the active one.
    ActivateSession,
}

impl HostCommand {
    /// Identifier the host registers the command under.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Reconnect => "editorBridge.reconnect",
            Self::ActivateSession => "editorBridge.activateSession",
        }
    }
}

/// Contents of the status indicator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusIndicator {
    pub text: String,
    pub tooltip: String,
    pub action: Option<HostCommand>,
    pub visible: bool,
}

impl StatusIndicator {
    /// Indicator that is not shown at all.
    #[must_use]
    pub fn hidden() -> Self {
        Self {
            text: String::new(),
            tooltip: String::new(),
            action: None,
            visible: false,
        }
    }
}

/// Status surface (status bar item plus user-facing error notifications).
pub trait StatusSurface: Send + Sync {
    /// Replace the indicator contents.
    fn update(&self, indicator: &StatusIndicator);

    /// Show a non-fatal error to the user.
    fn show_error(&self, message: &str);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_options_from_request() {
        let options = TerminalOptions::from(&CreateTerminal {
            name: Some("build".into()),
            working_directory: Some("/repo".into()),
            environment: None,
            shell_args: Some(vec!["-l".into()]),
            shell_path: Some("  ".into()),
            preserve_focus: false,
        });

        assert_eq!(options.name.as_deref(), Some("build"));
        assert_eq!(options.working_directory, Some(PathBuf::from("/repo")));
        assert!(options.environment.is_empty());
        assert_eq!(options.shell_args, vec!["-l"]);
        assert_eq!(options.shell_path, None);
    }

    #[test]
    fn test_blank_terminal_name_is_unset() {
        let options = TerminalOptions::from(&CreateTerminal {
            name: Some(String::new()),
            ..CreateTerminal::default()
        });
        assert_eq!(options, TerminalOptions::default());
    }
}
