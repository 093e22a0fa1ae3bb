//! Shared state holder for concrete providers
//!
//! A provider embeds a [`ProviderLifecycle`] and calls it at each lifecycle
//! step; the lifecycle keeps the [`ProviderStatus`] current and publishes the
//! matching events on the bus. It is the only publisher of connection, error,
//! health and request events for its provider. Registration events belong to
//! [`ProviderRegistry`](crate::ProviderRegistry).

use chrono::Utc;
use parking_lot::RwLock;
use ppa_core::TokenUsage;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::error::{LLMError, Result};
use crate::events::ProviderEventBus;
use crate::provider::{ConnectionState, HealthCheckResult, ProviderStatus};

/// Status and event publishing for one provider
#[derive(Debug, Clone)]
pub struct ProviderLifecycle {
    provider_id: String,
    bus: ProviderEventBus,
    status: Arc<RwLock<ProviderStatus>>,
}

impl ProviderLifecycle {
    pub fn new(provider_id: impl Into<String>, bus: ProviderEventBus) -> Self {
        Self {
            provider_id: provider_id.into(),
            bus,
            status: Arc::new(RwLock::new(ProviderStatus::default())),
        }
    }

    pub fn provider_id(&self) -> &str {
        &self.provider_id
    }

    pub fn bus(&self) -> &ProviderEventBus {
        &self.bus
    }

    /// Current status snapshot
    pub fn status(&self) -> ProviderStatus {
        self.status.read().clone()
    }

    pub fn state(&self) -> ConnectionState {
        self.status.read().state
    }

    pub fn mark_connecting(&self) -> Result<()> {
        self.transition(ConnectionState::Connecting, |_| {})
    }

    pub fn mark_connected(&self, model: Option<String>) -> Result<()> {
        self.transition(ConnectionState::Connected, |status| {
            status.is_available = true;
            status.error = None;
            if model.is_some() {
                status.active_model = model.clone();
            }
        })?;
        info!(provider_id = %self.provider_id, "Provider connected");
        let details = model.map(|m| serde_json::json!({ "model": m }));
        self.bus.emit_provider_connect(&self.provider_id, details);
        Ok(())
    }

    pub fn mark_disconnected(&self) -> Result<()> {
        self.transition(ConnectionState::Disconnected, |status| {
            status.is_available = false;
        })?;
        info!(provider_id = %self.provider_id, "Provider disconnected");
        self.bus.emit_provider_disconnect(&self.provider_id, None);
        Ok(())
    }

    /// Enter the error state and publish `error`
    ///
    /// Legal from every state, so repeated failures are each reported.
    pub fn mark_error(&self, error: LLMError) -> Result<()> {
        let message = error.to_string();
        self.transition(ConnectionState::Error, |status| {
            status.is_available = false;
            status.error = Some(message.clone());
        })?;
        warn!(provider_id = %self.provider_id, error = %message, "Provider entered error state");
        self.bus.emit_provider_error(&self.provider_id, error);
        Ok(())
    }

    pub fn record_health(&self, result: &HealthCheckResult) {
        {
            let mut status = self.status.write();
            status.last_health_check = Some(result.clone());
            status.updated_at = Some(Utc::now());
        }
        self.bus
            .emit_health_check(&self.provider_id, result.is_healthy, None);
    }

    pub fn update_config(&self, changes: Value) {
        self.bus.emit_config_change(&self.provider_id, changes);
    }

    /// Start tracking a request; a fresh id is generated when none is given
    pub fn begin_request(&self, request_id: Option<String>) -> RequestTracker {
        let request_id = request_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        self.bus.emit_request_start(&self.provider_id, &request_id);
        RequestTracker {
            provider_id: self.provider_id.clone(),
            request_id,
            bus: self.bus.clone(),
            started: Instant::now(),
            finished: false,
        }
    }

    fn transition<F>(&self, next: ConnectionState, update: F) -> Result<()>
    where
        F: FnOnce(&mut ProviderStatus),
    {
        let mut status = self.status.write();
        if !status.state.can_transition_to(next) {
            return Err(LLMError::InvalidStateTransition {
                from: status.state,
                to: next,
            });
        }
        status.state = next;
        status.updated_at = Some(Utc::now());
        update(&mut status);
        Ok(())
    }
}

/// One in-flight request
///
/// Finish it with [`complete`](Self::complete) or [`fail`](Self::fail). A
/// tracker dropped before either is reported as a failed request.
#[derive(Debug)]
pub struct RequestTracker {
    provider_id: String,
    request_id: String,
    bus: ProviderEventBus,
    started: Instant,
    finished: bool,
}

impl RequestTracker {
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn complete(mut self, usage: Option<TokenUsage>) {
        self.finished = true;
        self.bus.emit_request_complete(
            &self.provider_id,
            &self.request_id,
            self.started.elapsed(),
            usage,
        );
    }

    pub fn fail<E>(mut self, error: E)
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.finished = true;
        self.bus.emit_request_error(
            &self.provider_id,
            &self.request_id,
            error,
            self.started.elapsed(),
        );
    }
}

impl Drop for RequestTracker {
    fn drop(&mut self) {
        if !self.finished {
            self.bus.emit_request_error(
                &self.provider_id,
                &self.request_id,
                LLMError::Request("request dropped".to_string()),
                self.started.elapsed(),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{ProviderEvent, ProviderEventKind};
    use parking_lot::Mutex;

    fn recorder(bus: &ProviderEventBus) -> Arc<Mutex<Vec<ProviderEventKind>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        for kind in ProviderEventKind::ALL {
            let seen = seen.clone();
            bus.on_provider_event(kind, move |data| seen.lock().push(data.kind()));
        }
        seen
    }

    #[test]
    fn test_connect_disconnect_cycle() {
        let bus = ProviderEventBus::new();
        let seen = recorder(&bus);
        let lifecycle = ProviderLifecycle::new("ollama", bus);

        lifecycle.mark_connecting().unwrap();
        lifecycle.mark_connected(Some("llama3".to_string())).unwrap();
        assert!(lifecycle.status().is_connected());
        assert_eq!(lifecycle.status().active_model.as_deref(), Some("llama3"));

        lifecycle.mark_disconnected().unwrap();
        assert!(!lifecycle.status().is_available);

        assert_eq!(
            *seen.lock(),
            vec![ProviderEventKind::Connected, ProviderEventKind::Disconnected]
        );
    }

    #[test]
    fn test_invalid_transition_emits_nothing() {
        let bus = ProviderEventBus::new();
        let seen = recorder(&bus);
        let lifecycle = ProviderLifecycle::new("ollama", bus);

        let err = lifecycle.mark_disconnected().unwrap_err();
        assert!(matches!(
            err,
            LLMError::InvalidStateTransition {
                from: ConnectionState::Uninitialized,
                to: ConnectionState::Disconnected,
            }
        ));
        assert!(seen.lock().is_empty());
        assert_eq!(lifecycle.state(), ConnectionState::Uninitialized);
    }

    #[test]
    fn test_error_state_records_message() {
        let bus = ProviderEventBus::new();
        let lifecycle = ProviderLifecycle::new("lmstudio", bus);

        lifecycle
            .mark_error(LLMError::Connection("refused".to_string()))
            .unwrap();

        let status = lifecycle.status();
        assert_eq!(status.state, ConnectionState::Error);
        assert_eq!(status.error.as_deref(), Some("connection error: refused"));
    }

    #[test]
    fn test_repeated_failures_are_each_reported() {
        let bus = ProviderEventBus::new();
        let seen = recorder(&bus);
        let lifecycle = ProviderLifecycle::new("lmstudio", bus);

        lifecycle
            .mark_error(LLMError::Connection("refused".to_string()))
            .unwrap();
        lifecycle
            .mark_error(LLMError::Connection("timed out".to_string()))
            .unwrap();
        assert_eq!(
            lifecycle.status().error.as_deref(),
            Some("connection error: timed out")
        );

        lifecycle.mark_connecting().unwrap();
        lifecycle.mark_connected(None).unwrap();
        lifecycle.mark_disconnected().unwrap();
        lifecycle
            .mark_error(LLMError::Connection("refused".to_string()))
            .unwrap();

        let errors = seen
            .lock()
            .iter()
            .filter(|kind| **kind == ProviderEventKind::Error)
            .count();
        assert_eq!(errors, 3);
        assert_eq!(lifecycle.state(), ConnectionState::Error);
    }

    #[test]
    fn test_request_tracker_complete() {
        let bus = ProviderEventBus::new();
        let usage = Arc::new(Mutex::new(None));
        let usage_clone = usage.clone();
        bus.on_provider_event(ProviderEventKind::RequestComplete, move |data| {
            if let ProviderEvent::RequestComplete { token_usage, request_id, .. } = &data.event {
                *usage_clone.lock() = Some((request_id.clone(), *token_usage));
            }
        });
        let lifecycle = ProviderLifecycle::new("ollama", bus);

        let tracker = lifecycle.begin_request(Some("req-1".to_string()));
        tracker.complete(Some(TokenUsage::new(3, 4)));

        let (id, tokens) = usage.lock().take().unwrap();
        assert_eq!(id, "req-1");
        assert_eq!(tokens.map(|t| t.total_tokens), Some(7));
    }

    #[test]
    fn test_dropped_tracker_reports_error() {
        let bus = ProviderEventBus::new();
        let errors = Arc::new(Mutex::new(Vec::new()));
        let errors_clone = errors.clone();
        bus.on_provider_event(ProviderEventKind::RequestError, move |data| {
            errors_clone
                .lock()
                .push(data.error().map(|e| e.to_string()).unwrap_or_default());
        });
        let lifecycle = ProviderLifecycle::new("ollama", bus);

        let tracker = lifecycle.begin_request(None);
        assert!(!tracker.request_id().is_empty());
        drop(tracker);

        assert_eq!(
            *errors.lock(),
            vec!["request failed: request dropped".to_string()]
        );
    }

    #[test]
    fn test_health_is_stored() {
        let lifecycle = ProviderLifecycle::new("ollama", ProviderEventBus::new());
        lifecycle.record_health(&HealthCheckResult::unhealthy("timeout"));
        let last = lifecycle.status().last_health_check.unwrap();
        assert!(!last.is_healthy);
    }
}
