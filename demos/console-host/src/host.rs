//! Console implementation of the host primitives.
//!
//! Terminals are child processes sharing this console's stdout. Everything
//! else is an editor concept the console can only log.

use std::{
    collections::HashMap,
    process::Stdio,
    sync::{
        Mutex, MutexGuard, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};

use editor_bridge_core::{
    CommandHost, DocumentHandle, DocumentHost, HostError, SnippetHost, StatusIndicator,
    StatusSurface, TerminalHandle, TerminalHost, TerminalOptions,
};
use serde_json::Value;
use tokio::{io::AsyncWriteExt, process::Command, sync::mpsc};

use crate::shell::resolve_shell;

const SCRATCH_DOCUMENT: DocumentHandle = DocumentHandle(1);

struct ConsoleTerminal {
    name: String,
    child: tokio::process::Child,
    input: mpsc::UnboundedSender<String>,
}

/// Host backed by the process console.
pub struct ConsoleHost {
    terminals: Mutex<HashMap<TerminalHandle, ConsoleTerminal>>,
    active_terminal: Mutex<Option<TerminalHandle>>,
    next_terminal: AtomicU64,
    language: Mutex<String>,
}

impl Default for ConsoleHost {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleHost {
    #[must_use]
    pub fn new() -> Self {
        Self {
            terminals: Mutex::new(HashMap::new()),
            active_terminal: Mutex::new(None),
            next_terminal: AtomicU64::new(1),
            language: Mutex::new("plaintext".to_string()),
        }
    }

    /// One line per open terminal.
    pub fn describe_terminals(&self) -> Vec<String> {
        let active = *lock(&self.active_terminal);
        let mut lines: Vec<_> = lock(&self.terminals)
            .iter()
            .map(|(handle, t)| {
                let marker = if Some(*handle) == active { "*" } else { " " };
                format!("{marker} #{} {} (pid {:?})", handle.0, t.name, t.child.id())
            })
            .collect();
        lines.sort();
        lines
    }
}

impl TerminalHost for ConsoleHost {
    fn create(&self, options: &TerminalOptions) -> Result<TerminalHandle, HostError> {
        let shell = resolve_shell(options.shell_path.as_deref()).ok_or_else(|| {
            let requested = options
                .shell_path
                .as_ref()
                .map_or_else(|| "the default shell".to_string(), |p| p.display().to_string());
            HostError::CommandFailed(format!("cannot find {requested}"))
        })?;

        let mut command = Command::new(&shell);
        command
            .args(&options.shell_args)
            .envs(&options.environment)
            .stdin(Stdio::piped())
            .kill_on_drop(true);
        if let Some(cwd) = &options.working_directory {
            command.current_dir(cwd);
        }

        let mut child = command.spawn()?;
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| HostError::CommandFailed("terminal has no stdin".into()))?;

        let (input, mut lines) = mpsc::unbounded_channel::<String>();
        tokio::spawn(async move {
            while let Some(line) = lines.recv().await {
                if let Err(e) = stdin.write_all(format!("{line}\n").as_bytes()).await {
                    tracing::warn!("Terminal input closed: {e}");
                    break;
                }
            }
        });

        let handle = TerminalHandle(self.next_terminal.fetch_add(1, Ordering::Relaxed));
        let name = options
            .name
            .clone()
            .unwrap_or_else(|| shell.display().to_string());
        tracing::info!(terminal = handle.0, %name, shell = %shell.display(), "Terminal created");

        lock(&self.terminals).insert(
            handle,
            ConsoleTerminal {
                name,
                child,
                input,
            },
        );
        Ok(handle)
    }

    fn show(&self, terminal: TerminalHandle, preserve_focus: bool) -> Result<(), HostError> {
        if !lock(&self.terminals).contains_key(&terminal) {
            return Err(HostError::TerminalNotFound(terminal));
        }
        *lock(&self.active_terminal) = Some(terminal);
        tracing::info!(terminal = terminal.0, preserve_focus, "Terminal shown");
        Ok(())
    }

    fn send_text(&self, terminal: TerminalHandle, text: &str) -> Result<(), HostError> {
        let terminals = lock(&self.terminals);
        let entry = terminals
            .get(&terminal)
            .ok_or(HostError::TerminalNotFound(terminal))?;
        entry
            .input
            .send(text.to_string())
            .map_err(|_| HostError::CommandFailed(format!("terminal {} has exited", entry.name)))
    }

    fn active_terminal(&self) -> Option<TerminalHandle> {
        *lock(&self.active_terminal)
    }

    fn dispose(&self, terminal: TerminalHandle) {
        let Some(mut entry) = lock(&self.terminals).remove(&terminal) else {
            return;
        };
        let _ = entry.child.start_kill();
        let mut active = lock(&self.active_terminal);
        if *active == Some(terminal) {
            *active = None;
        }
        tracing::info!(terminal = terminal.0, name = %entry.name, "Terminal disposed");
    }
}

impl CommandHost for ConsoleHost {
    fn execute(&self, command: &str, arguments: Option<Value>) -> Result<(), HostError> {
        match arguments {
            Some(arguments) => tracing::info!(%command, %arguments, "Execute command"),
            None => tracing::info!(%command, "Execute command"),
        }
        Ok(())
    }
}

impl DocumentHost for ConsoleHost {
    fn active_document(&self) -> Option<DocumentHandle> {
        Some(SCRATCH_DOCUMENT)
    }

    fn set_language(&self, document: DocumentHandle, language_id: &str) -> Result<(), HostError> {
        if document != SCRATCH_DOCUMENT {
            return Err(HostError::DocumentNotFound(document));
        }
        let previous = std::mem::replace(&mut *lock(&self.language), language_id.to_string());
        tracing::info!(from = %previous, to = %language_id, "Document language changed");
        Ok(())
    }
}

impl SnippetHost for ConsoleHost {
    fn insert_snippet(&self, name: &str) -> Result<(), HostError> {
        tracing::info!(snippet = %name, "Insert snippet");
        Ok(())
    }
}

impl StatusSurface for ConsoleHost {
    fn update(&self, indicator: &StatusIndicator) {
        if !indicator.visible {
            tracing::info!("[status] (hidden)");
            return;
        }
        match indicator.action {
            Some(action) => tracing::info!(
                "[status] {} - {} ({})",
                indicator.text,
                indicator.tooltip,
                action.id()
            ),
            None => tracing::info!("[status] {} - {}", indicator.text, indicator.tooltip),
        }
    }

    fn show_error(&self, message: &str) {
        tracing::error!("{message}");
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
