//! Recording host doubles for tests.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicU64, Ordering},
};

use editor_bridge_core::{
    CommandHost, DocumentHandle, DocumentHost, HostError, SnippetHost, StatusIndicator,
    StatusSurface, TerminalHandle, TerminalHost, TerminalOptions,
};
use serde_json::Value;

/// One host primitive invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Create(TerminalOptions),
    Show(TerminalHandle, bool),
    SendText(TerminalHandle, String),
    Dispose(TerminalHandle),
    Execute(String, Option<Value>),
    SetLanguage(DocumentHandle, String),
    InsertSnippet(String),
}

/// Host that records every call.
#[derive(Default)]
pub struct RecordingHost {
    calls: Mutex<Vec<Call>>,
    indicators: Mutex<Vec<StatusIndicator>>,
    errors: Mutex<Vec<String>>,
    active_terminal: Mutex<Option<TerminalHandle>>,
    active_document: Mutex<Option<DocumentHandle>>,
    next_terminal: AtomicU64,
    fail_create: AtomicBool,
    fail_commands: AtomicBool,
}

impl RecordingHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn indicators(&self) -> Vec<StatusIndicator> {
        self.indicators.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }

    pub fn set_active_terminal(&self, terminal: Option<TerminalHandle>) {
        *self.active_terminal.lock().unwrap() = terminal;
    }

    pub fn set_active_document(&self, document: Option<DocumentHandle>) {
        *self.active_document.lock().unwrap() = document;
    }

    pub fn fail_terminal_creation(&self) {
        self.fail_create.store(true, Ordering::SeqCst);
    }

    pub fn fail_commands(&self) {
        self.fail_commands.store(true, Ordering::SeqCst);
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl TerminalHost for RecordingHost {
    fn create(&self, options: &TerminalOptions) -> Result<TerminalHandle, HostError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(HostError::CommandFailed("shell not found".into()));
        }
        self.record(Call::Create(options.clone()));
        Ok(TerminalHandle(self.next_terminal.fetch_add(1, Ordering::SeqCst) + 1))
    }

    fn show(&self, terminal: TerminalHandle, preserve_focus: bool) -> Result<(), HostError> {
        self.record(Call::Show(terminal, preserve_focus));
        Ok(())
    }

    fn send_text(&self, terminal: TerminalHandle, text: &str) -> Result<(), HostError> {
        self.record(Call::SendText(terminal, text.to_string()));
        Ok(())
    }

    fn active_terminal(&self) -> Option<TerminalHandle> {
        *self.active_terminal.lock().unwrap()
    }

    fn dispose(&self, terminal: TerminalHandle) {
        self.record(Call::Dispose(terminal));
    }
}

impl CommandHost for RecordingHost {
    fn execute(&self, command: &str, arguments: Option<Value>) -> Result<(), HostError> {
        if self.fail_commands.load(Ordering::SeqCst) {
            return Err(HostError::CommandFailed(command.to_string()));
        }
        self.record(Call::Execute(command.to_string(), arguments));
        Ok(())
    }
}

impl DocumentHost for RecordingHost {
    fn active_document(&self) -> Option<DocumentHandle> {
        *self.active_document.lock().unwrap()
    }

    fn set_language(&self, document: DocumentHandle, language_id: &str) -> Result<(), HostError> {
        self.record(Call::SetLanguage(document, language_id.to_string()));
        Ok(())
    }
}

impl SnippetHost for RecordingHost {
    fn insert_snippet(&self, name: &str) -> Result<(), HostError> {
        self.record(Call::InsertSnippet(name.to_string()));
        Ok(())
    }
}

impl StatusSurface for RecordingHost {
    fn update(&self, indicator: &StatusIndicator) {
        self.indicators.lock().unwrap().push(indicator.clone());
    }

    fn show_error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }
}
