//! Command routing.
//!
//! One bus handler per command kind. Each handler checks its precondition,
//! calls the matching host primitive, and logs the outcome. Failures never
//! propagate past the handler, so a bad command cannot block the next one.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use editor_bridge_core::{
    ChangeLanguage, CreateTerminal, EventBus, ExecuteCommand, ExecuteTerminalCommand, HostError,
    InsertSnippet, MessageKind, Subscription, TerminalHandle, TerminalOptions,
};
use serde_json::Value;
use thiserror::Error;

use crate::hosts::EditorHosts;

/// Why a command was not carried out.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("No active terminal")]
    NoActiveTerminal,
    #[error("No active document")]
    NoActiveDocument,
    #[error("Empty {0}")]
    EmptyField(&'static str),
    #[error("Terminals are closed until the bridge is activated again")]
    TerminalsClosed,
    #[error(transparent)]
    Host(#[from] HostError),
}

impl CommandError {
    /// Missing target or empty field: usually a benign race with focus, so it
    /// is dropped quietly.
    #[must_use]
    pub const fn is_precondition(&self) -> bool {
        !matches!(self, Self::Host(_))
    }
}

/// Command arguments were not valid JSON.
#[derive(Debug, Error)]
#[error("Invalid command arguments: {0}")]
pub struct ArgumentParseError(#[from] serde_json::Error);

/// Resolve `ExecuteCommand.arguments`.
///
/// Text is parsed as JSON; blank text and JSON `null` mean "no arguments".
/// Structured values are passed through unchanged.
///
/// # Errors
/// Returns error if text arguments are not valid JSON.
pub fn parse_arguments(raw: Option<&Value>) -> Result<Option<Value>, ArgumentParseError> {
    let value = match raw {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(text)) if text.trim().is_empty() => return Ok(None),
        Some(Value::String(text)) => serde_json::from_str(text.trim())?,
        Some(other) => other.clone(),
    };
    Ok((!value.is_null()).then_some(value))
}

struct OwnedTerminals {
    handles: Vec<TerminalHandle>,
    /// Cleared by disposal so a create racing a deactivate cannot leak.
    accepting: bool,
}

/// Routes command messages to host primitives.
pub struct CommandRouter {
    hosts: EditorHosts,
    terminals: Mutex<OwnedTerminals>,
}

impl CommandRouter {
    #[must_use]
    pub fn new(hosts: EditorHosts) -> Arc<Self> {
        Arc::new(Self {
            hosts,
            terminals: Mutex::new(OwnedTerminals {
                handles: Vec::new(),
                accepting: true,
            }),
        })
    }

    /// Subscribe one handler per command kind.
    pub fn register(self: &Arc<Self>, bus: &EventBus) -> Vec<Subscription> {
        let router = Arc::clone(self);
        let create = bus.subscribe::<CreateTerminal, _>(move |m| {
            let result = router.create_terminal(m).map(|_| ());
            router.report(MessageKind::CreateTerminal, result);
        });

        let router = Arc::clone(self);
        let terminal_command = bus.subscribe::<ExecuteTerminalCommand, _>(move |m| {
            router.report(
                MessageKind::ExecuteTerminalCommand,
                router.execute_terminal_command(m),
            );
        });

        let router = Arc::clone(self);
        let command = bus.subscribe::<ExecuteCommand, _>(move |m| {
            router.report(MessageKind::ExecuteCommand, router.execute_command(m));
        });

        let router = Arc::clone(self);
        let language = bus.subscribe::<ChangeLanguage, _>(move |m| {
            router.report(MessageKind::ChangeLanguage, router.change_language(m));
        });

        let router = Arc::clone(self);
        let snippet = bus.subscribe::<InsertSnippet, _>(move |m| {
            router.report(MessageKind::InsertSnippet, router.insert_snippet(m));
        });

        vec![create, terminal_command, command, language, snippet]
    }

    /// Open a terminal and show it. The handle is kept for disposal.
    ///
    /// # Errors
    /// Returns error if terminals were disposed and not reopened, or if the
    /// host cannot create or show the terminal.
    pub fn create_terminal(&self, request: &CreateTerminal) -> Result<TerminalHandle, CommandError> {
        let options = TerminalOptions::from(request);
        let terminal = {
            let mut owned = self.lock_terminals();
            if !owned.accepting {
                return Err(CommandError::TerminalsClosed);
            }
            let terminal = self.hosts.terminals.create(&options)?;
            owned.handles.push(terminal);
            terminal
        };

        self.hosts
            .terminals
            .show(terminal, request.preserve_focus)?;
        Ok(terminal)
    }

    /// Type a command line into the active terminal.
    ///
    /// # Errors
    /// Returns error if there is no active terminal, the command is empty, or
    /// the host write fails.
    pub fn execute_terminal_command(
        &self,
        request: &ExecuteTerminalCommand,
    ) -> Result<(), CommandError> {
        let terminal = self
            .hosts
            .terminals
            .active_terminal()
            .ok_or(CommandError::NoActiveTerminal)?;
        if request.command.is_empty() {
            return Err(CommandError::EmptyField("command"));
        }

        self.hosts.terminals.show(terminal, true)?;
        self.hosts.terminals.send_text(terminal, &request.command)?;
        Ok(())
    }

    /// Run an editor command. Arguments that fail to parse are dropped and the
    /// command runs without them.
    ///
    /// # Errors
    /// Returns error if the command is empty or the host rejects it.
    pub fn execute_command(&self, request: &ExecuteCommand) -> Result<(), CommandError> {
        if request.command.is_empty() {
            return Err(CommandError::EmptyField("command"));
        }

        let arguments = parse_arguments(request.arguments.as_ref()).unwrap_or_else(|e| {
            tracing::debug!(command = %request.command, "{e}; running without arguments");
            None
        });

        self.hosts.commands.execute(&request.command, arguments)?;
        Ok(())
    }

    /// Change the language of the active document.
    ///
    /// # Errors
    /// Returns error if there is no active document or the host rejects it.
    pub fn change_language(&self, request: &ChangeLanguage) -> Result<(), CommandError> {
        let document = self
            .hosts
            .documents
            .active_document()
            .ok_or(CommandError::NoActiveDocument)?;

        self.hosts
            .documents
            .set_language(document, &request.language_id)?;
        Ok(())
    }

    /// Insert a named snippet.
    ///
    /// # Errors
    /// Returns error if the name is empty or the host rejects it.
    pub fn insert_snippet(&self, request: &InsertSnippet) -> Result<(), CommandError> {
        if request.name.is_empty() {
            return Err(CommandError::EmptyField("name"));
        }

        self.hosts.snippets.insert_snippet(&request.name)?;
        Ok(())
    }

    /// Terminals opened on behalf of the server.
    #[must_use]
    pub fn owned_terminals(&self) -> Vec<TerminalHandle> {
        self.lock_terminals().handles.clone()
    }

    /// Dispose every terminal opened on behalf of the server and refuse new
    /// ones until [`Self::reopen_terminals`].
    pub fn dispose_terminals(&self) {
        let terminals = {
            let mut owned = self.lock_terminals();
            owned.accepting = false;
            std::mem::take(&mut owned.handles)
        };
        for terminal in terminals {
            self.hosts.terminals.dispose(terminal);
        }
    }

    /// Accept `CreateTerminal` again after a disposal.
    pub fn reopen_terminals(&self) {
        self.lock_terminals().accepting = true;
    }

    fn report(&self, kind: MessageKind, result: Result<(), CommandError>) {
        match result {
            Ok(()) => tracing::debug!(?kind, "Command handled"),
            Err(e) if e.is_precondition() => tracing::debug!(?kind, "Command dropped: {e}"),
            Err(e) => {
                tracing::warn!(?kind, "Command failed: {e}");
                if kind == MessageKind::CreateTerminal {
                    self.hosts
                        .status
                        .show_error(&format!("Failed to create terminal: {e}"));
                }
            }
        }
    }

    fn lock_terminals(&self) -> MutexGuard<'_, OwnedTerminals> {
        self.terminals.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
