use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Result of a provider health check
///
/// `timestamp` is epoch milliseconds and `latency` is milliseconds. An
/// unhealthy result is expected to carry an `error` explaining why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckResult {
    pub is_healthy: bool,
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl HealthCheckResult {
    /// A healthy result stamped with the current time
    pub fn healthy(latency: Duration) -> Self {
        Self {
            is_healthy: true,
            timestamp: Utc::now().timestamp_millis(),
            latency: Some(latency.as_millis() as u64),
            error: None,
            details: None,
        }
    }

    /// An unhealthy result stamped with the current time
    pub fn unhealthy(error: impl Into<String>) -> Self {
        Self {
            is_healthy: false,
            timestamp: Utc::now().timestamp_millis(),
            latency: None,
            error: Some(error.into()),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn latency(&self) -> Option<Duration> {
        self.latency.map(Duration::from_millis)
    }
}
