//! Session arbitration.
//!
//! Several editor windows may share one remote session. Whichever window was
//! announced last is the active one. Announcements are fire-and-forget, so
//! two windows focused at nearly the same time may both believe they are
//! active until the next announcement reaches them.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use editor_bridge_core::{ActivationState, ActiveSessionChanged, SessionId};

use crate::status::StatusPresenter;

/// Tracks whether this window is the authoritative one.
pub struct SessionArbitrator {
    session_id: SessionId,
    state: Mutex<ActivationState>,
    status: Arc<StatusPresenter>,
}

impl SessionArbitrator {
    /// Create an inactive arbitrator for this window.
    #[must_use]
    pub fn new(session_id: SessionId, status: Arc<StatusPresenter>) -> Self {
        Self {
            session_id,
            state: Mutex::new(ActivationState::Inactive),
            status,
        }
    }

    /// This window's session identifier.
    #[must_use]
    pub const fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    #[must_use]
    pub fn state(&self) -> ActivationState {
        *self.lock()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state() == ActivationState::Active
    }

    /// Whether `session_id` names this window.
    #[must_use]
    pub fn is_own(&self, session_id: &SessionId) -> bool {
        *session_id == self.session_id
    }

    /// React to an announcement received from the server.
    pub fn handle_announcement(&self, announcement: &ActiveSessionChanged) {
        if self.is_own(&announcement.session_id) {
            self.set_session_as_active();
        } else {
            tracing::debug!(active = %announcement.session_id, "Another window took over the session");
            self.set_session_as_inactive();
        }
    }

    pub fn set_session_as_active(&self) {
        self.transition(ActivationState::Active);
    }

    pub fn set_session_as_inactive(&self) {
        self.transition(ActivationState::Inactive);
    }

    fn transition(&self, next: ActivationState) {
        let previous = std::mem::replace(&mut *self.lock(), next);
        if previous != next {
            tracing::info!(session = %self.session_id, ?next, "Activation state changed");
        }
        self.status.set_activation(next);
    }

    fn lock(&self) -> MutexGuard<'_, ActivationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingHost;

    fn arbitrator(id: &str) -> SessionArbitrator {
        let status = Arc::new(StatusPresenter::new(RecordingHost::new()));
        SessionArbitrator::new(SessionId::new(id), status)
    }

    fn announce(id: &str) -> ActiveSessionChanged {
        ActiveSessionChanged {
            session_id: SessionId::new(id),
        }
    }

    #[test]
    fn test_starts_inactive() {
        assert_eq!(arbitrator("a").state(), ActivationState::Inactive);
    }

    #[test]
    fn test_two_windows_converge_on_announcement() {
        let a = arbitrator("a");
        let b = arbitrator("b");

        // Prior state: B believes it is active.
        b.set_session_as_active();

        let announcement = announce("a");
        a.handle_announcement(&announcement);
        b.handle_announcement(&announcement);

        assert_eq!(a.state(), ActivationState::Active);
        assert_eq!(b.state(), ActivationState::Inactive);

        // And back again.
        let announcement = announce("b");
        a.handle_announcement(&announcement);
        b.handle_announcement(&announcement);

        assert_eq!(a.state(), ActivationState::Inactive);
        assert_eq!(b.state(), ActivationState::Active);
    }

    #[test]
    fn test_repeated_own_announcement_stays_active() {
        let a = arbitrator("a");
        a.handle_announcement(&announce("a"));
        a.handle_announcement(&announce("a"));
        assert!(a.is_active());
    }

    #[test]
    fn test_transition_updates_status_surface() {
        let host = RecordingHost::new();
        let status = Arc::new(StatusPresenter::new(host.clone()));
        status.set_connection(editor_bridge_core::ConnectionState::Connected);
        let a = SessionArbitrator::new(SessionId::new("a"), status);

        a.set_session_as_active();

        let last = host.indicators().pop().unwrap();
        assert!(!last.visible);
    }
}
