//! Structural and semantic checks for provider artifacts
//!
//! Every check collects all violations instead of stopping at the first one
//! and reports them through a [`ValidationResult`]. The raw `serde_json::Value`
//! entry points accept settings exactly as the host stores them; the typed
//! entry points serialize and delegate.

mod config;
mod health;
mod provider;
mod response;

use ppa_core::LLMResponse;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::provider::{HealthCheckResult, LLMProvider, ProviderCapabilities, ProviderConfig};

/// Outcome of a validation call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
        }
    }

    pub fn from_errors(errors: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }

    /// Append the errors of another result
    pub fn merge(mut self, other: ValidationResult) -> Self {
        self.errors.extend(other.errors);
        self.is_valid = self.errors.is_empty();
        self
    }
}

/// Stateless provider validator
#[derive(Debug, Clone, Copy, Default)]
pub struct ProviderValidator;

impl ProviderValidator {
    /// Validate raw provider settings
    pub fn validate_config(config: &Value) -> ValidationResult {
        ValidationResult::from_errors(config::check(config))
    }

    /// Validate a typed provider configuration
    pub fn validate_provider_config(config: &ProviderConfig) -> ValidationResult {
        serialized(config, Self::validate_config)
    }

    /// Validate a raw health check result
    pub fn validate_health(result: &Value) -> ValidationResult {
        ValidationResult::from_errors(health::check(result))
    }

    /// Validate a typed health check result
    pub fn validate_health_result(result: &HealthCheckResult) -> ValidationResult {
        serialized(result, Self::validate_health)
    }

    /// Validate a raw completion response payload
    pub fn validate_response(response: &Value) -> ValidationResult {
        ValidationResult::from_errors(response::check(response))
    }

    /// Validate a typed completion response
    pub fn validate_llm_response(response: &LLMResponse) -> ValidationResult {
        serialized(response, Self::validate_response)
    }

    /// Validate a raw capability declaration
    pub fn validate_capabilities(capabilities: &Value) -> ValidationResult {
        ValidationResult::from_errors(provider::check_capabilities(capabilities))
    }

    /// Validate typed capabilities
    pub fn validate_provider_capabilities(capabilities: &ProviderCapabilities) -> ValidationResult {
        serialized(capabilities, Self::validate_capabilities)
    }

    /// Exercise a live provider; never fails, provider errors become messages
    pub async fn validate_provider(provider: &dyn LLMProvider) -> ValidationResult {
        ValidationResult::from_errors(provider::check_provider(provider).await)
    }
}

fn serialized<T, F>(value: &T, check: F) -> ValidationResult
where
    T: Serialize,
    F: FnOnce(&Value) -> ValidationResult,
{
    match serde_json::to_value(value) {
        Ok(json) => check(&json),
        Err(e) => ValidationResult::from_errors(vec![format!("Failed to serialize value: {}", e)]),
    }
}

/// `Some(n)` when `value` is a number
fn as_number(value: Option<&Value>) -> Option<f64> {
    value.and_then(Value::as_f64)
}

/// The value of a JSON number with no fractional part that fits in a `u64`
///
/// Integral floats such as `5.0` are accepted.
fn as_non_negative_integer(value: &Value) -> Option<u64> {
    if let Some(n) = value.as_u64() {
        return Some(n);
    }
    value
        .as_f64()
        .filter(|n| n.is_finite() && *n >= 0.0 && n.fract() == 0.0 && *n < u64::MAX as f64)
        .map(|n| n as u64)
}

/// A present, non-empty string
fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// Absent keys and explicit `null` are treated alike
fn present<'a>(object: &'a serde_json::Map<String, Value>, key: &str) -> Option<&'a Value> {
    object.get(key).filter(|v| !v.is_null())
}
