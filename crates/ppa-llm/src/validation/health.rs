use serde_json::Value;

use super::{as_number, non_empty_str, present};

pub(super) fn check(result: &Value) -> Vec<String> {
    let Some(object) = result.as_object() else {
        return vec!["Health check result must be an object".to_string()];
    };

    let mut errors = Vec::new();

    let is_healthy = object.get("isHealthy").and_then(Value::as_bool);
    if is_healthy.is_none() {
        errors.push("Health status (isHealthy) must be a boolean".to_string());
    }

    if !as_number(object.get("timestamp")).is_some_and(|t| t >= 0.0) {
        errors.push("Timestamp must be a non-negative number".to_string());
    }

    if let Some(latency) = present(object, "latency") {
        if !as_number(Some(latency)).is_some_and(|l| l >= 0.0) {
            errors.push("Latency must be a non-negative number".to_string());
        }
    }

    if is_healthy == Some(false) && non_empty_str(object.get("error")).is_none() {
        errors.push("Unhealthy status must include an error description".to_string());
    }

    errors
}
