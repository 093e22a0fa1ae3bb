//! Provider lifecycle and request events
//!
//! Every event is a [`ProviderEventData`] stamped at emission time. The
//! [`ProviderEventKind`] tag selects which listeners run; the
//! [`ProviderEvent`] payload carries the per-tag fields.

pub mod bus;

pub use bus::{ListenerId, ProviderEventBus};

use chrono::{DateTime, Utc};
use ppa_core::TokenUsage;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Caller-supplied error carried inside an event
pub type SharedError = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Event tag used for subscriptions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProviderEventKind {
    Initialized,
    Connected,
    Disconnected,
    Error,
    HealthCheck,
    RequestStart,
    RequestComplete,
    RequestError,
    Destroyed,
    ConfigChanged,
    MetricsUpdate,
}

impl ProviderEventKind {
    pub const ALL: [ProviderEventKind; 11] = [
        Self::Initialized,
        Self::Connected,
        Self::Disconnected,
        Self::Error,
        Self::HealthCheck,
        Self::RequestStart,
        Self::RequestComplete,
        Self::RequestError,
        Self::Destroyed,
        Self::ConfigChanged,
        Self::MetricsUpdate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initialized => "initialized",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::Error => "error",
            Self::HealthCheck => "healthCheck",
            Self::RequestStart => "requestStart",
            Self::RequestComplete => "requestComplete",
            Self::RequestError => "requestError",
            Self::Destroyed => "destroyed",
            Self::ConfigChanged => "configChanged",
            Self::MetricsUpdate => "metricsUpdate",
        }
    }
}

impl std::fmt::Display for ProviderEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Aggregated request metrics for one provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderMetrics {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub total_tokens: u64,
    pub average_latency_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_health: Option<bool>,
}

impl ProviderMetrics {
    /// Requests that have finished, successfully or not
    pub fn finished_requests(&self) -> u64 {
        self.successful_requests + self.failed_requests
    }

    /// Fold one finished request into the running average
    pub fn record_latency(&mut self, latency: Duration) {
        let ms = latency.as_millis() as u64;
        let n = self.finished_requests().max(1) as f64;
        self.average_latency_ms += (ms as f64 - self.average_latency_ms) / n;
        self.last_latency_ms = Some(ms);
    }
}

/// Typed payload of a provider event
#[derive(Debug, Clone)]
pub enum ProviderEvent {
    Initialized { details: Option<Value> },
    Connected { details: Option<Value> },
    Disconnected { details: Option<Value> },
    Error { error: SharedError },
    HealthCheck {
        is_healthy: bool,
        metrics: Option<ProviderMetrics>,
    },
    RequestStart { request_id: String },
    RequestComplete {
        request_id: String,
        duration: Duration,
        token_usage: Option<TokenUsage>,
    },
    RequestError {
        request_id: String,
        error: SharedError,
        duration: Duration,
    },
    Destroyed { details: Option<Value> },
    ConfigChanged { changes: Value },
    MetricsUpdate { metrics: ProviderMetrics },
}

impl ProviderEvent {
    pub fn kind(&self) -> ProviderEventKind {
        match self {
            Self::Initialized { .. } => ProviderEventKind::Initialized,
            Self::Connected { .. } => ProviderEventKind::Connected,
            Self::Disconnected { .. } => ProviderEventKind::Disconnected,
            Self::Error { .. } => ProviderEventKind::Error,
            Self::HealthCheck { .. } => ProviderEventKind::HealthCheck,
            Self::RequestStart { .. } => ProviderEventKind::RequestStart,
            Self::RequestComplete { .. } => ProviderEventKind::RequestComplete,
            Self::RequestError { .. } => ProviderEventKind::RequestError,
            Self::Destroyed { .. } => ProviderEventKind::Destroyed,
            Self::ConfigChanged { .. } => ProviderEventKind::ConfigChanged,
            Self::MetricsUpdate { .. } => ProviderEventKind::MetricsUpdate,
        }
    }
}

/// An emitted event: who, when and what
#[derive(Debug, Clone)]
pub struct ProviderEventData {
    pub provider_id: String,
    pub timestamp: DateTime<Utc>,
    pub event: ProviderEvent,
}

impl ProviderEventData {
    /// Stamp an event with the current time
    pub fn new(provider_id: impl Into<String>, event: ProviderEvent) -> Self {
        Self {
            provider_id: provider_id.into(),
            timestamp: Utc::now(),
            event,
        }
    }

    pub fn kind(&self) -> ProviderEventKind {
        self.event.kind()
    }

    /// The error carried by `Error` and `RequestError` events
    pub fn error(&self) -> Option<&SharedError> {
        match &self.event {
            ProviderEvent::Error { error } | ProviderEvent::RequestError { error, .. } => Some(error),
            _ => None,
        }
    }

    /// The request id carried by request events
    pub fn request_id(&self) -> Option<&str> {
        match &self.event {
            ProviderEvent::RequestStart { request_id }
            | ProviderEvent::RequestComplete { request_id, .. }
            | ProviderEvent::RequestError { request_id, .. } => Some(request_id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LLMError;

    #[test]
    fn test_event_kind_matches_payload() {
        let data = ProviderEventData::new(
            "ollama",
            ProviderEvent::RequestStart { request_id: "r1".to_string() },
        );
        assert_eq!(data.kind(), ProviderEventKind::RequestStart);
        assert_eq!(data.request_id(), Some("r1"));
        assert!(data.error().is_none());
    }

    #[test]
    fn test_error_accessor() {
        let error: SharedError = Arc::new(LLMError::Connection("refused".to_string()));
        let data = ProviderEventData::new("lmstudio", ProviderEvent::Error { error });
        assert_eq!(
            data.error().map(|e| e.to_string()),
            Some("connection error: refused".to_string())
        );
    }

    #[test]
    fn test_running_latency_average() {
        let mut metrics = ProviderMetrics::default();
        metrics.successful_requests = 1;
        metrics.record_latency(Duration::from_millis(100));
        metrics.successful_requests = 2;
        metrics.record_latency(Duration::from_millis(200));

        assert_eq!(metrics.average_latency_ms, 150.0);
        assert_eq!(metrics.last_latency_ms, Some(200));
    }

    #[test]
    fn test_all_kinds_are_distinct() {
        let names: std::collections::HashSet<_> =
            ProviderEventKind::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(names.len(), ProviderEventKind::ALL.len());
    }
}
