//! Composition root.
//!
//! `BridgeController` is built once by the host at startup and shared by
//! `Arc` with every callback the host registers. It wires the connection
//! manager, the session arbitrator and the command router onto one bus.

use std::sync::Arc;

use editor_bridge_core::{
    ActivationState, ActiveSessionChanged, ConnectionConfig, ConnectionState,
    ConnectionStateChanged, EventBus, HostCommand, SessionId, WindowState,
};
use editor_bridge_transport::{ClientMessage, ConnectionError, ConnectionManager, Connector};

use crate::{
    arbitrator::SessionArbitrator, hosts::EditorHosts, router::CommandRouter,
    status::StatusPresenter,
};

/// Bridge between the session server and one editor window.
pub struct BridgeController<C: Connector> {
    bus: Arc<EventBus>,
    connection: Arc<ConnectionManager<C>>,
    arbitrator: Arc<SessionArbitrator>,
    router: Arc<CommandRouter>,
    status: Arc<StatusPresenter>,
}

impl<C: Connector> BridgeController<C> {
    /// Wire every component. Nothing connects until [`Self::activate`].
    #[must_use]
    pub fn new(
        session_id: SessionId,
        connector: C,
        config: ConnectionConfig,
        hosts: EditorHosts,
    ) -> Arc<Self> {
        let bus = Arc::new(EventBus::new());
        let status = Arc::new(StatusPresenter::new(Arc::clone(&hosts.status)));
        let arbitrator = Arc::new(SessionArbitrator::new(session_id, Arc::clone(&status)));
        let router = CommandRouter::new(hosts);
        let connection = ConnectionManager::new(connector, config, Arc::clone(&bus));

        router.register(&bus);

        let on_announcement = Arc::clone(&arbitrator);
        bus.subscribe::<ActiveSessionChanged, _>(move |m| on_announcement.handle_announcement(m));

        let on_state = Arc::clone(&status);
        bus.subscribe::<ConnectionStateChanged, _>(move |change| {
            on_state.set_connection(change.state);
        });

        Arc::new(Self {
            bus,
            connection,
            arbitrator,
            router,
            status,
        })
    }

    /// Bus carrying every inbound message and connection notification. Hosts
    /// may subscribe to it for extra behaviour.
    #[must_use]
    pub const fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        self.arbitrator.session_id()
    }

    #[must_use]
    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    #[must_use]
    pub fn activation_state(&self) -> ActivationState {
        self.arbitrator.state()
    }

    #[must_use]
    pub const fn connection(&self) -> &Arc<ConnectionManager<C>> {
        &self.connection
    }

    #[must_use]
    pub const fn router(&self) -> &Arc<CommandRouter> {
        &self.router
    }

    /// Show the status indicator and connect.
    ///
    /// # Errors
    /// Returns error if the server cannot be reached.
    pub async fn activate(&self) -> Result<(), ConnectionError> {
        self.router.reopen_terminals();
        self.status.refresh();
        self.connection.activate().await
    }

    /// Hide the status indicator, disconnect, and dispose terminals opened for
    /// the server.
    pub fn deactivate(&self) {
        self.status.hide();
        self.connection.deactivate();
        self.router.dispose_terminals();
    }

    /// # Errors
    /// Returns error if the server cannot be reached.
    pub async fn reconnect(&self) -> Result<(), ConnectionError> {
        self.router.reopen_terminals();
        self.status.refresh();
        self.connection.reconnect().await
    }

    /// Announce `session_id` as the active window. When it is this window's
    /// own id, this window is promoted immediately rather than waiting for
    /// the server to echo the announcement.
    ///
    /// # Errors
    /// Returns error if the announcement cannot be sent.
    pub fn change_active_session(&self, session_id: &SessionId) -> Result<(), ConnectionError> {
        if self.arbitrator.is_own(session_id) {
            self.arbitrator.set_session_as_active();
        }

        self.connection
            .send(&ClientMessage::active_session(session_id.clone()))
            .inspect_err(|e| tracing::warn!(session = %session_id, "Failed to announce active session: {e}"))
    }

    /// Focus gained announces this window; focus lost changes nothing.
    ///
    /// # Errors
    /// Returns error if the announcement cannot be sent.
    pub fn window_state_changed(&self, state: WindowState) -> Result<(), ConnectionError> {
        if !state.focused {
            return Ok(());
        }
        let own = self.session_id().clone();
        self.change_active_session(&own)
    }

    /// Take a fresh configuration; reconnects only if host or port changed.
    ///
    /// # Errors
    /// Returns error if the reconnect fails.
    pub async fn configuration_changed(
        &self,
        config: ConnectionConfig,
    ) -> Result<bool, ConnectionError> {
        self.connection.configuration_changed(config).await
    }

    pub fn set_session_as_active(&self) {
        self.arbitrator.set_session_as_active();
    }

    pub fn set_session_as_inactive(&self) {
        self.arbitrator.set_session_as_inactive();
    }

    /// Run a command bound to the status indicator or registered by the host.
    ///
    /// # Errors
    /// Returns error if reconnecting or announcing fails.
    pub async fn run_host_command(&self, command: HostCommand) -> Result<(), ConnectionError> {
        tracing::debug!(command = command.id(), "Running host command");
        match command {
            HostCommand::Reconnect => self.reconnect().await,
            HostCommand::ActivateSession => {
                let own = self.session_id().clone();
                self.change_active_session(&own)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use editor_bridge_core::{CreateTerminal, StatusIndicator, TerminalHandle, TerminalOptions};
    use editor_bridge_transport::MemoryConnector;
    use tokio_test::{assert_err, assert_ok};

    use super::*;
    use crate::testing::{Call, RecordingHost};

    struct Window {
        host: Arc<RecordingHost>,
        connector: MemoryConnector,
        controller: Arc<BridgeController<MemoryConnector>>,
    }

    fn window(id: &str) -> Window {
        let host = RecordingHost::new();
        let connector = MemoryConnector::new();
        let controller = BridgeController::new(
            SessionId::new(id),
            connector.clone(),
            ConnectionConfig::default(),
            EditorHosts::from_single(&host),
        );
        Window {
            host,
            connector,
            controller,
        }
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    /// Forward everything `from` sent to every window, the way the server
    /// broadcasts announcements.
    fn relay(from: &Window, to: &[&Window]) {
        let frames = from
            .connector
            .with_latest_peer(editor_bridge_transport::MemoryPeer::drain_sent)
            .unwrap_or_default();
        for frame in frames {
            for window in to {
                window
                    .connector
                    .with_latest_peer(|peer| peer.send_frame(frame.clone()));
            }
        }
    }

    #[tokio::test]
    async fn test_create_terminal_end_to_end() {
        let w = window("a");
        assert_ok!(w.controller.activate().await);

        w.connector.with_latest_peer(|peer| {
            peer.send_frame(
                r#"{"type":"createTerminal","name":"build","workingDirectory":"/repo","shellArgs":["-l"],"preserveFocus":false}"#,
            )
        });
        settle().await;

        assert_eq!(
            w.host.calls(),
            vec![
                Call::Create(TerminalOptions {
                    name: Some("build".into()),
                    working_directory: Some("/repo".into()),
                    shell_args: vec!["-l".into()],
                    ..TerminalOptions::default()
                }),
                Call::Show(TerminalHandle(1), false),
            ]
        );
        assert_eq!(w.controller.router().owned_terminals(), vec![TerminalHandle(1)]);

        w.controller.deactivate();
        assert_eq!(w.host.calls().last(), Some(&Call::Dispose(TerminalHandle(1))));
    }

    #[tokio::test]
    async fn test_two_windows_converge() {
        let a = window("a");
        let b = window("b");
        assert_ok!(a.controller.activate().await);
        assert_ok!(b.controller.activate().await);

        assert_ok!(b.controller.window_state_changed(WindowState { focused: true }));
        relay(&b, &[&a, &b]);
        settle().await;
        assert_eq!(a.controller.activation_state(), ActivationState::Inactive);
        assert_eq!(b.controller.activation_state(), ActivationState::Active);

        assert_ok!(a.controller.window_state_changed(WindowState { focused: true }));
        relay(&a, &[&a, &b]);
        settle().await;
        assert_eq!(a.controller.activation_state(), ActivationState::Active);
        assert_eq!(b.controller.activation_state(), ActivationState::Inactive);
    }

    #[tokio::test]
    async fn test_losing_focus_does_not_demote() {
        let w = window("a");
        assert_ok!(w.controller.activate().await);

        assert_ok!(w.controller.window_state_changed(WindowState { focused: true }));
        assert_ok!(w.controller.window_state_changed(WindowState { focused: false }));

        assert_eq!(w.controller.activation_state(), ActivationState::Active);
        let sent = w
            .connector
            .with_latest_peer(editor_bridge_transport::MemoryPeer::drain_sent)
            .unwrap();
        assert_eq!(sent.len(), 1);
    }

    #[tokio::test]
    async fn test_announce_while_disconnected_fails_but_promotes_locally() {
        let w = window("a");

        let err = assert_err!(w.controller.run_host_command(HostCommand::ActivateSession).await);
        assert!(matches!(err, ConnectionError::NotConnected));
        assert_eq!(w.controller.activation_state(), ActivationState::Active);
    }

    #[tokio::test]
    async fn test_disconnect_updates_status_and_reconnect_command_recovers() {
        let w = window("a");
        assert_ok!(w.controller.activate().await);
        assert_eq!(
            w.host.indicators().last().and_then(|i| i.action),
            Some(HostCommand::ActivateSession)
        );

        w.connector.with_latest_peer(|peer| peer.close(None));
        settle().await;
        assert_eq!(w.controller.connection_state(), ConnectionState::Disconnected);
        assert_eq!(
            w.host.indicators().last().and_then(|i| i.action),
            Some(HostCommand::Reconnect)
        );

        assert_ok!(w.controller.run_host_command(HostCommand::Reconnect).await);
        assert_eq!(w.controller.connection_state(), ConnectionState::Connected);
        assert_eq!(w.connector.attempts(), 2);
    }

    #[tokio::test]
    async fn test_commands_stop_after_deactivate() {
        let w = window("a");
        assert_ok!(w.controller.activate().await);
        w.controller.deactivate();

        w.connector.with_latest_peer(|peer| {
            peer.send_frame(r#"{"type":"insertSnippet","name":"late"}"#)
        });
        settle().await;

        assert!(w.host.calls().is_empty());
    }

    #[tokio::test]
    async fn test_deactivate_hides_status_until_activated_again() {
        let w = window("a");
        assert_ok!(w.controller.activate().await);

        w.controller.deactivate();
        assert_eq!(w.host.indicators().last(), Some(&StatusIndicator::hidden()));

        assert_ok!(w.controller.activate().await);
        let last = w.host.indicators().last().cloned().unwrap();
        assert!(last.visible);
        assert_eq!(last.action, Some(HostCommand::ActivateSession));
    }

    #[tokio::test]
    async fn test_terminal_requested_after_deactivate_is_not_created() {
        let w = window("a");
        assert_ok!(w.controller.activate().await);
        w.controller.deactivate();

        w.controller.bus().publish(&CreateTerminal::default());
        assert!(w.host.calls().is_empty());

        assert_ok!(w.controller.activate().await);
        w.controller.bus().publish(&CreateTerminal::default());
        assert_eq!(w.controller.router().owned_terminals(), vec![TerminalHandle(1)]);
    }

    #[tokio::test]
    async fn test_configuration_change_reconnects_only_on_difference() {
        let w = window("a");
        assert_ok!(w.controller.activate().await);

        assert!(!assert_ok!(
            w.controller
                .configuration_changed(ConnectionConfig::default())
                .await
        ));
        assert!(assert_ok!(
            w.controller
                .configuration_changed(ConnectionConfig::new("devbox", 5000))
                .await
        ));
        assert_eq!(w.connector.attempts(), 2);
        assert_eq!(w.connector.live_links(), 1);
    }
}
