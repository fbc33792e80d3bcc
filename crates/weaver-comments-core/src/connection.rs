//! Replication session state as seen by the anchor pipeline.
//!
//! The pipeline never drives these transitions. It records whatever the
//! replication session reports and uses the result to decide whether an
//! anchor that fails to resolve is "not known yet" or "gone for good".

use serde::{Deserialize, Serialize};

/// Connection state machine states.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No replication session.
    #[default]
    Disconnected,
    /// Handshake in progress, the local replica may still be behind.
    Loading,
    /// The local replica has caught up.
    Synced,
}

impl ConnectionState {
    /// Returns true if unresolved anchors should be treated as final.
    pub fn is_authoritative(&self) -> bool {
        matches!(self, Self::Synced)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Loading => "loading",
            Self::Synced => "synced",
        }
    }
}

/// A state change observed by [`ConnectionMonitor::apply`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConnectionTransition {
    pub from: ConnectionState,
    pub to: ConnectionState,
    /// Set on the very first arrival at `Synced`.
    pub first_load: bool,
}

impl ConnectionTransition {
    /// Returns true if this transition made resolution authoritative.
    pub fn became_authoritative(&self) -> bool {
        !self.from.is_authoritative() && self.to.is_authoritative()
    }
}

/// Projection of the external session signal.
#[derive(Clone, Debug, Default)]
pub struct ConnectionMonitor {
    state: ConnectionState,
    initial_load_done: bool,
}

impl ConnectionMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a notification from the replication session.
    ///
    /// Returns the transition, or `None` if the state did not change.
    pub fn apply(&mut self, state: ConnectionState) -> Option<ConnectionTransition> {
        if state == self.state {
            return None;
        }

        let first_load = state.is_authoritative() && !self.initial_load_done;
        if state.is_authoritative() {
            self.initial_load_done = true;
        }

        let transition = ConnectionTransition {
            from: self.state,
            to: state,
            first_load,
        };
        self.state = state;

        tracing::debug!(
            from = transition.from.as_str(),
            to = transition.to.as_str(),
            first_load,
            "connection state changed"
        );
        Some(transition)
    }

    pub fn current_state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_authoritative(&self) -> bool {
        self.state.is_authoritative()
    }

    /// Whether the session has ever been synced. Stays set across later
    /// disconnects.
    pub fn initial_load_done(&self) -> bool {
        self.initial_load_done
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monitor_starts_disconnected() {
        let monitor = ConnectionMonitor::new();
        assert_eq!(monitor.current_state(), ConnectionState::Disconnected);
        assert!(!monitor.is_authoritative());
        assert!(!monitor.initial_load_done());
    }

    #[test]
    fn test_only_synced_is_authoritative() {
        assert!(!ConnectionState::Disconnected.is_authoritative());
        assert!(!ConnectionState::Loading.is_authoritative());
        assert!(ConnectionState::Synced.is_authoritative());
    }

    #[test]
    fn test_repeated_state_is_not_a_transition() {
        let mut monitor = ConnectionMonitor::new();
        assert!(monitor.apply(ConnectionState::Loading).is_some());
        assert!(monitor.apply(ConnectionState::Loading).is_none());
    }

    #[test]
    fn test_first_load_reported_once() {
        let mut monitor = ConnectionMonitor::new();
        monitor.apply(ConnectionState::Loading);

        let first = monitor.apply(ConnectionState::Synced).unwrap();
        assert!(first.first_load);
        assert!(first.became_authoritative());

        // Transport loss, then a resync.
        let lost = monitor.apply(ConnectionState::Disconnected).unwrap();
        assert!(!lost.first_load);
        assert!(monitor.initial_load_done());

        monitor.apply(ConnectionState::Loading);
        let again = monitor.apply(ConnectionState::Synced).unwrap();
        assert!(!again.first_load);
        assert!(again.became_authoritative());
    }
}
