//! Provider 指标订阅者
//!
//! 订阅 provider 事件总线，按请求 ID 关联开始与结束事件，为每个 provider
//! 维护聚合指标并同步写入 `metrics` 记录器。

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use ppa_llm::{
    ListenerId, ProviderEvent, ProviderEventBus, ProviderEventData, ProviderEventKind,
    ProviderMetrics,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use super::{
    PROVIDER_ERRORS_TOTAL, PROVIDER_HEALTHY, PROVIDER_REQUESTS_FAILED, PROVIDER_REQUESTS_SUCCEEDED,
    PROVIDER_REQUESTS_TOTAL, PROVIDER_REQUEST_DURATION, PROVIDER_TOKENS_TOTAL,
};

/// 订阅的事件类型
const SUBSCRIBED: [ProviderEventKind; 5] = [
    ProviderEventKind::RequestStart,
    ProviderEventKind::RequestComplete,
    ProviderEventKind::RequestError,
    ProviderEventKind::HealthCheck,
    ProviderEventKind::Error,
];

/// 尚未结束的请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    /// Provider ID
    pub provider_id: String,
    /// 请求 ID
    pub request_id: String,
    /// 开始时间
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct State {
    providers: RwLock<HashMap<String, ProviderMetrics>>,
    pending: Mutex<HashMap<(String, String), DateTime<Utc>>>,
}

impl State {
    fn handle(&self, data: &ProviderEventData) {
        let provider_id = data.provider_id.as_str();
        match &data.event {
            ProviderEvent::RequestStart { request_id } => {
                self.pending.lock().insert(
                    (provider_id.to_string(), request_id.clone()),
                    data.timestamp,
                );
                self.providers
                    .write()
                    .entry(provider_id.to_string())
                    .or_default()
                    .total_requests += 1;
                metrics::counter!(PROVIDER_REQUESTS_TOTAL, "provider" => provider_id.to_string())
                    .increment(1);
            }
            ProviderEvent::RequestComplete {
                request_id,
                duration,
                token_usage,
            } => {
                let tokens = token_usage.map(|u| u.total_tokens).unwrap_or(0);
                self.finish(provider_id, request_id, *duration, true, |m| {
                    m.total_tokens += tokens;
                });
                metrics::counter!(PROVIDER_REQUESTS_SUCCEEDED, "provider" => provider_id.to_string())
                    .increment(1);
                if tokens > 0 {
                    metrics::counter!(PROVIDER_TOKENS_TOTAL, "provider" => provider_id.to_string())
                        .increment(tokens);
                }
            }
            ProviderEvent::RequestError {
                request_id,
                duration,
                ..
            } => {
                self.finish(provider_id, request_id, *duration, false, |_| {});
                metrics::counter!(PROVIDER_REQUESTS_FAILED, "provider" => provider_id.to_string())
                    .increment(1);
            }
            ProviderEvent::HealthCheck { is_healthy, .. } => {
                self.providers
                    .write()
                    .entry(provider_id.to_string())
                    .or_default()
                    .last_health = Some(*is_healthy);
                let value = if *is_healthy { 1.0 } else { 0.0 };
                metrics::gauge!(PROVIDER_HEALTHY, "provider" => provider_id.to_string()).set(value);
            }
            ProviderEvent::Error { .. } => {
                metrics::counter!(PROVIDER_ERRORS_TOTAL, "provider" => provider_id.to_string())
                    .increment(1);
            }
            _ => {}
        }
    }

    fn finish<F>(&self, provider_id: &str, request_id: &str, duration: Duration, success: bool, update: F)
    where
        F: FnOnce(&mut ProviderMetrics),
    {
        let started = self
            .pending
            .lock()
            .remove(&(provider_id.to_string(), request_id.to_string()));

        let mut providers = self.providers.write();
        let entry = providers.entry(provider_id.to_string()).or_default();
        if started.is_none() {
            // Completion without a start we saw, e.g. attached mid-request
            tracing::debug!(
                provider_id = %provider_id,
                request_id = %request_id,
                "Unpaired request completion"
            );
            entry.total_requests += 1;
        }
        if success {
            entry.successful_requests += 1;
        } else {
            entry.failed_requests += 1;
        }
        entry.record_latency(duration);
        update(entry);

        metrics::histogram!(PROVIDER_REQUEST_DURATION, "provider" => provider_id.to_string())
            .record(duration.as_secs_f64());
    }
}

/// Provider 指标收集器
#[derive(Debug)]
pub struct ProviderMetricsCollector {
    bus: ProviderEventBus,
    state: Arc<State>,
    listeners: Mutex<Vec<(ProviderEventKind, ListenerId)>>,
}

impl ProviderMetricsCollector {
    /// 订阅事件总线
    pub fn attach(bus: &ProviderEventBus) -> Self {
        let state = Arc::new(State::default());
        let listeners = SUBSCRIBED
            .iter()
            .map(|kind| {
                let state = Arc::clone(&state);
                let id = bus.on_provider_event(*kind, move |data| state.handle(data));
                (*kind, id)
            })
            .collect();

        tracing::debug!(
            target: "ppa_observability",
            "Provider metrics collector attached"
        );

        Self {
            bus: bus.clone(),
            state,
            listeners: Mutex::new(listeners),
        }
    }

    /// 某个 provider 的指标快照
    pub fn snapshot(&self, provider_id: &str) -> Option<ProviderMetrics> {
        self.state.providers.read().get(provider_id).cloned()
    }

    /// 所有 provider 的指标快照
    pub fn snapshot_all(&self) -> HashMap<String, ProviderMetrics> {
        self.state.providers.read().clone()
    }

    /// 尚未结束的请求，按开始时间排序
    pub fn pending_requests(&self) -> Vec<PendingRequest> {
        let mut pending: Vec<PendingRequest> = self
            .state
            .pending
            .lock()
            .iter()
            .map(|((provider_id, request_id), started_at)| PendingRequest {
                provider_id: provider_id.clone(),
                request_id: request_id.clone(),
                started_at: *started_at,
            })
            .collect();
        pending.sort_by_key(|p| p.started_at);
        pending
    }

    /// 为每个 provider 发出 `MetricsUpdate` 事件
    pub fn publish(&self, bus: &ProviderEventBus) {
        for (provider_id, metrics) in self.snapshot_all() {
            bus.emit_metrics_update(&provider_id, metrics);
        }
    }

    /// 取消订阅
    pub fn detach(&self) {
        for (kind, id) in self.listeners.lock().drain(..) {
            self.bus.off_provider_event(kind, id);
        }
    }

    /// 是否仍在订阅
    pub fn is_attached(&self) -> bool {
        !self.listeners.lock().is_empty()
    }
}

impl Drop for ProviderMetricsCollector {
    fn drop(&mut self) {
        self.detach();
    }
}
