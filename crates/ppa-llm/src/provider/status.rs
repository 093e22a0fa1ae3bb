use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::provider::HealthCheckResult;

/// Connection state of a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Uninitialized,
    Connecting,
    Connected,
    Disconnected,
    Error,
}

impl ConnectionState {
    /// Whether moving from `self` to `next` is a legal lifecycle step
    ///
    /// `Error` can be entered from any state, including `Error` itself.
    pub fn can_transition_to(&self, next: ConnectionState) -> bool {
        use ConnectionState::*;

        matches!(
            (self, next),
            (_, Error)
                | (Uninitialized, Connecting | Connected)
                | (Connecting, Connected | Disconnected)
                | (Connected, Disconnected)
                | (Error, Connecting | Connected | Disconnected)
                | (Disconnected, Connecting | Connected)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Point-in-time status snapshot of a provider
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStatus {
    pub state: ConnectionState,
    pub is_available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_health_check: Option<HealthCheckResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ProviderStatus {
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ConnectionState::*;

    #[test]
    fn test_lifecycle_transitions() {
        assert!(Uninitialized.can_transition_to(Connected));
        assert!(Uninitialized.can_transition_to(Error));
        assert!(Connected.can_transition_to(Disconnected));
        assert!(Error.can_transition_to(Disconnected));
        assert!(Disconnected.can_transition_to(Connected));
    }

    #[test]
    fn test_error_reachable_from_every_state() {
        for state in [Uninitialized, Connecting, Connected, Disconnected, Error] {
            assert!(state.can_transition_to(Error), "{} -> error", state);
        }
    }

    #[test]
    fn test_illegal_transitions() {
        assert!(!Uninitialized.can_transition_to(Disconnected));
        assert!(!Connected.can_transition_to(Connected));
        assert!(!Disconnected.can_transition_to(Disconnected));
        assert!(!Connected.can_transition_to(Uninitialized));
    }

    #[test]
    fn test_default_status() {
        let status = ProviderStatus::default();
        assert_eq!(status.state, Uninitialized);
        assert!(!status.is_connected());
        assert!(!status.is_available);
    }
}
