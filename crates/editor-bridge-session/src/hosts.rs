//! Bundle of host collaborators handed to the controller.

use std::sync::Arc;

use editor_bridge_core::{CommandHost, DocumentHost, SnippetHost, StatusSurface, TerminalHost};

/// Host primitives the bridge acts through.
#[derive(Clone)]
pub struct EditorHosts {
    pub terminals: Arc<dyn TerminalHost>,
    pub commands: Arc<dyn CommandHost>,
    pub documents: Arc<dyn DocumentHost>,
    pub snippets: Arc<dyn SnippetHost>,
    pub status: Arc<dyn StatusSurface>,
}

impl EditorHosts {
    /// Use one object for every primitive.
    #[must_use]
    pub fn from_single<H>(host: &Arc<H>) -> Self
    where
        H: TerminalHost + CommandHost + DocumentHost + SnippetHost + StatusSurface + 'static,
    {
        Self {
            terminals: host.clone(),
            commands: host.clone(),
            documents: host.clone(),
            snippets: host.clone(),
            status: host.clone(),
        }
    }
}
