//! Status indicator presentation.
//!
//! Folds connection and activation state into one [`StatusIndicator`] and
//! pushes it to the host's [`StatusSurface`] whenever it changes.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use editor_bridge_core::{
    ActivationState, ConnectionState, HostCommand, StatusIndicator, StatusSurface,
};

const TITLE: &str = "Editor Bridge";

struct Shown {
    connection: ConnectionState,
    activation: ActivationState,
    hidden: bool,
    last: Option<StatusIndicator>,
}

/// Drives the status surface.
pub struct StatusPresenter {
    surface: Arc<dyn StatusSurface>,
    shown: Mutex<Shown>,
}

impl StatusPresenter {
    #[must_use]
    pub fn new(surface: Arc<dyn StatusSurface>) -> Self {
        Self {
            surface,
            shown: Mutex::new(Shown {
                connection: ConnectionState::Disconnected,
                activation: ActivationState::Inactive,
                hidden: false,
                last: None,
            }),
        }
    }

    /// Indicator for a pair of states.
    #[must_use]
    pub fn indicator(connection: ConnectionState, activation: ActivationState) -> StatusIndicator {
        match (connection, activation) {
            (ConnectionState::Disconnected, _) => StatusIndicator {
                text: format!("{TITLE}: disconnected"),
                tooltip: "Click to reconnect.".to_string(),
                action: Some(HostCommand::Reconnect),
                visible: true,
            },
            (ConnectionState::Connecting, _) => StatusIndicator {
                text: format!("{TITLE}: connecting"),
                tooltip: "Connecting to the session server.".to_string(),
                action: None,
                visible: true,
            },
            (ConnectionState::Connected, ActivationState::Inactive) => StatusIndicator {
                text: format!("{TITLE}: inactive"),
                tooltip: "Click to activate this session.".to_string(),
                action: Some(HostCommand::ActivateSession),
                visible: true,
            },
            (ConnectionState::Connected, ActivationState::Active) => StatusIndicator::hidden(),
        }
    }

    pub fn set_connection(&self, state: ConnectionState) {
        let mut shown = self.lock();
        shown.connection = state;
        self.render(&mut shown);
    }

    pub fn set_activation(&self, state: ActivationState) {
        let mut shown = self.lock();
        shown.activation = state;
        self.render(&mut shown);
    }

    /// Show the indicator again and push it even if it has not changed.
    pub fn refresh(&self) {
        let mut shown = self.lock();
        shown.hidden = false;
        shown.last = None;
        self.render(&mut shown);
    }

    /// Remove the indicator until the next [`Self::refresh`]. State changes
    /// are still tracked while hidden.
    pub fn hide(&self) {
        let mut shown = self.lock();
        shown.hidden = true;
        self.render(&mut shown);
    }

    fn render(&self, shown: &mut Shown) {
        let indicator = if shown.hidden {
            StatusIndicator::hidden()
        } else {
            Self::indicator(shown.connection, shown.activation)
        };
        if shown.last.as_ref() == Some(&indicator) {
            return;
        }
        self.surface.update(&indicator);
        shown.last = Some(indicator);
    }

    fn lock(&self) -> MutexGuard<'_, Shown> {
        self.shown.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingHost;

    #[test]
    fn test_disconnected_binds_reconnect() {
        let indicator =
            StatusPresenter::indicator(ConnectionState::Disconnected, ActivationState::Active);
        assert!(indicator.visible);
        assert_eq!(indicator.action, Some(HostCommand::Reconnect));
    }

    #[test]
    fn test_inactive_binds_activate_session() {
        let indicator =
            StatusPresenter::indicator(ConnectionState::Connected, ActivationState::Inactive);
        assert_eq!(indicator.action, Some(HostCommand::ActivateSession));
        assert_eq!(indicator.tooltip, "Click to activate this session.");
    }

    #[test]
    fn test_active_hides_indicator() {
        let indicator =
            StatusPresenter::indicator(ConnectionState::Connected, ActivationState::Active);
        assert!(!indicator.visible);
    }

    #[test]
    fn test_unchanged_indicator_is_not_pushed_twice() {
        let host = RecordingHost::new();
        let presenter = StatusPresenter::new(host.clone());

        presenter.set_connection(ConnectionState::Connected);
        presenter.set_connection(ConnectionState::Connected);
        presenter.set_activation(ActivationState::Active);
        presenter.refresh();

        let shown = host.indicators();
        assert_eq!(shown.len(), 3);
        assert_eq!(shown[0].action, Some(HostCommand::ActivateSession));
        assert!(!shown[1].visible);
        assert_eq!(shown[1], shown[2]);
    }

    #[test]
    fn test_hidden_indicator_stays_hidden_until_refresh() {
        let host = RecordingHost::new();
        let presenter = StatusPresenter::new(host.clone());
        presenter.set_connection(ConnectionState::Connected);

        presenter.hide();
        presenter.set_connection(ConnectionState::Disconnected);
        assert_eq!(host.indicators().last(), Some(&StatusIndicator::hidden()));
        assert_eq!(host.indicators().len(), 2);

        presenter.refresh();
        let last = host.indicators().last().cloned().unwrap();
        assert!(last.visible);
        assert_eq!(last.action, Some(HostCommand::Reconnect));
    }
}
