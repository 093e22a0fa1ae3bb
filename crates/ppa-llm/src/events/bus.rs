//! Synchronous publish/subscribe table for provider events

use parking_lot::RwLock;
use ppa_core::TokenUsage;
use serde_json::Value;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{trace, warn};

use crate::error::panic_message;
use crate::events::{ProviderEvent, ProviderEventData, ProviderEventKind, ProviderMetrics};

type Listener = Arc<dyn Fn(&ProviderEventData) + Send + Sync>;

/// Handle returned by [`ProviderEventBus::on_provider_event`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Default)]
struct Inner {
    listeners: RwLock<HashMap<ProviderEventKind, Vec<(ListenerId, Listener)>>>,
    next_id: AtomicU64,
}

/// Provider event bus
///
/// Cloning yields another handle to the same listener table. Listeners for a
/// tag run in subscription order inside the emitting call; a panicking
/// listener is logged and skipped so the remaining ones still run.
#[derive(Clone, Default)]
pub struct ProviderEventBus {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for ProviderEventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderEventBus")
            .field("listeners", &self.total_listeners())
            .finish()
    }
}

impl ProviderEventBus {
    /// Create an empty bus
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `listener` to one event tag
    pub fn on_provider_event<F>(&self, kind: ProviderEventKind, listener: F) -> ListenerId
    where
        F: Fn(&ProviderEventData) + Send + Sync + 'static,
    {
        let id = ListenerId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        self.inner
            .listeners
            .write()
            .entry(kind)
            .or_default()
            .push((id, Arc::new(listener)));
        trace!(event = %kind, listener = ?id, "Provider event listener added");
        id
    }

    /// Unsubscribe a listener; returns whether it was registered for `kind`
    pub fn off_provider_event(&self, kind: ProviderEventKind, id: ListenerId) -> bool {
        let mut listeners = self.inner.listeners.write();
        let Some(entries) = listeners.get_mut(&kind) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|(listener_id, _)| *listener_id != id);
        let removed = entries.len() != before;
        if entries.is_empty() {
            listeners.remove(&kind);
        }
        removed
    }

    /// Drop every subscription for every tag
    pub fn clear_all_listeners(&self) {
        self.inner.listeners.write().clear();
    }

    /// Number of listeners subscribed to `kind`
    pub fn listener_count(&self, kind: ProviderEventKind) -> usize {
        self.inner
            .listeners
            .read()
            .get(&kind)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Number of listeners across all tags
    pub fn total_listeners(&self) -> usize {
        self.inner.listeners.read().values().map(Vec::len).sum()
    }

    /// Deliver an event to every listener of its tag
    pub fn emit(&self, data: ProviderEventData) {
        let kind = data.kind();
        // Snapshot so listeners can subscribe, unsubscribe or emit re-entrantly.
        let snapshot: Vec<(ListenerId, Listener)> = self
            .inner
            .listeners
            .read()
            .get(&kind)
            .cloned()
            .unwrap_or_default();

        for (id, listener) in snapshot {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| listener(&data))) {
                warn!(
                    provider_id = %data.provider_id,
                    event = %kind,
                    listener = ?id,
                    "Provider event listener panicked: {}",
                    panic_message(payload.as_ref())
                );
            }
        }
    }

    fn emit_event(&self, provider_id: &str, event: ProviderEvent) {
        self.emit(ProviderEventData::new(provider_id, event));
    }

    pub fn emit_provider_init(&self, provider_id: &str, details: Option<Value>) {
        self.emit_event(provider_id, ProviderEvent::Initialized { details });
    }

    pub fn emit_provider_connect(&self, provider_id: &str, details: Option<Value>) {
        self.emit_event(provider_id, ProviderEvent::Connected { details });
    }

    pub fn emit_provider_disconnect(&self, provider_id: &str, details: Option<Value>) {
        self.emit_event(provider_id, ProviderEvent::Disconnected { details });
    }

    pub fn emit_provider_error<E>(&self, provider_id: &str, error: E)
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.emit_event(provider_id, ProviderEvent::Error { error: Arc::new(error) });
    }

    pub fn emit_provider_destroy(&self, provider_id: &str, details: Option<Value>) {
        self.emit_event(provider_id, ProviderEvent::Destroyed { details });
    }

    pub fn emit_health_check(
        &self,
        provider_id: &str,
        is_healthy: bool,
        metrics: Option<ProviderMetrics>,
    ) {
        self.emit_event(provider_id, ProviderEvent::HealthCheck { is_healthy, metrics });
    }

    pub fn emit_request_start(&self, provider_id: &str, request_id: &str) {
        self.emit_event(
            provider_id,
            ProviderEvent::RequestStart {
                request_id: request_id.to_string(),
            },
        );
    }

    pub fn emit_request_complete(
        &self,
        provider_id: &str,
        request_id: &str,
        duration: Duration,
        token_usage: Option<TokenUsage>,
    ) {
        self.emit_event(
            provider_id,
            ProviderEvent::RequestComplete {
                request_id: request_id.to_string(),
                duration,
                token_usage,
            },
        );
    }

    pub fn emit_request_error<E>(&self, provider_id: &str, request_id: &str, error: E, duration: Duration)
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.emit_event(
            provider_id,
            ProviderEvent::RequestError {
                request_id: request_id.to_string(),
                error: Arc::new(error),
                duration,
            },
        );
    }

    pub fn emit_config_change(&self, provider_id: &str, changes: Value) {
        self.emit_event(provider_id, ProviderEvent::ConfigChanged { changes });
    }

    pub fn emit_metrics_update(&self, provider_id: &str, metrics: ProviderMetrics) {
        self.emit_event(provider_id, ProviderEvent::MetricsUpdate { metrics });
    }
}
