use futures::FutureExt;
use serde_json::Value;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tracing::{debug, warn};

use crate::error::panic_message;
use crate::provider::LLMProvider;

use super::health;

const BOOLEAN_FLAGS: [&str; 3] = [
    "supportsStreaming",
    "supportsChatCompletion",
    "supportsSystemPrompts",
];

pub(super) fn check_capabilities(capabilities: &Value) -> Vec<String> {
    let Some(object) = capabilities.as_object() else {
        return vec!["Provider capabilities must be an object".to_string()];
    };

    let mut errors = Vec::new();

    if !object.get("supportedModels").is_some_and(Value::is_array) {
        errors.push("supportedModels must be an array".to_string());
    }
    for flag in BOOLEAN_FLAGS {
        if !object.get(flag).is_some_and(Value::is_boolean) {
            errors.push(format!("{} must be a boolean", flag));
        }
    }
    if !object.get("maxContextLength").is_some_and(Value::is_number) {
        errors.push("maxContextLength must be a number".to_string());
    }

    errors
}

pub(super) async fn check_provider(provider: &dyn LLMProvider) -> Vec<String> {
    let id = match std::panic::catch_unwind(AssertUnwindSafe(|| provider.id().to_string())) {
        Ok(id) => id,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!(error = %message, "Provider id could not be read");
            return vec![format!("Provider validation failed: {}", message)];
        }
    };

    let mut errors = Vec::new();
    if id.trim().is_empty() {
        errors.push("Provider ID must be a non-empty string".to_string());
    }

    if let Err(message) = exercise(provider, &mut errors).await {
        errors.push(format!("Provider validation failed: {}", message));
    }

    if errors.is_empty() {
        debug!(provider_id = %id, "Provider passed validation");
    } else {
        warn!(provider_id = %id, errors = ?errors, "Provider failed validation");
    }
    errors
}

/// Run the behavioral checks; `Err` carries the first provider failure
async fn exercise(provider: &dyn LLMProvider, errors: &mut Vec<String>) -> Result<(), String> {
    let capabilities = guarded(provider.get_capabilities()).await?;
    match serde_json::to_value(&capabilities) {
        Ok(value) => errors.extend(check_capabilities(&value)),
        Err(e) => return Err(e.to_string()),
    }

    let health_result = guarded(provider.health_check()).await?;
    match serde_json::to_value(&health_result) {
        Ok(value) => errors.extend(health::check(&value)),
        Err(e) => return Err(e.to_string()),
    }

    Ok(())
}

/// Await a provider call, folding both errors and panics into a message
async fn guarded<T, F>(call: F) -> Result<T, String>
where
    F: Future<Output = crate::Result<T>>,
{
    match AssertUnwindSafe(call).catch_unwind().await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(e.to_string()),
        Err(payload) => Err(panic_message(payload.as_ref())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_capabilities() {
        let caps = json!({
            "supportedModels": ["llama3"],
            "supportsStreaming": true,
            "supportsChatCompletion": true,
            "supportsSystemPrompts": false,
            "maxContextLength": 8192
        });
        assert!(check_capabilities(&caps).is_empty());
    }

    #[test]
    fn test_capability_errors_accumulate() {
        let caps = json!({
            "supportedModels": "llama3",
            "supportsStreaming": "yes",
            "maxContextLength": "big"
        });
        assert_eq!(
            check_capabilities(&caps),
            vec![
                "supportedModels must be an array".to_string(),
                "supportsStreaming must be a boolean".to_string(),
                "supportsChatCompletion must be a boolean".to_string(),
                "supportsSystemPrompts must be a boolean".to_string(),
                "maxContextLength must be a number".to_string(),
            ]
        );
    }

    #[test]
    fn test_capabilities_non_object() {
        assert_eq!(
            check_capabilities(&Value::Null),
            vec!["Provider capabilities must be an object".to_string()]
        );
    }
}
