use serde_json::{Map, Value};
use url::Url;

use super::{as_non_negative_integer, as_number, non_empty_str, present};

/// Top-level fields every provider configuration must carry
pub(crate) const REQUIRED_FIELDS: [&str; 2] = ["apiEndpoint", "connection"];

pub(crate) const MIN_POOL_SIZE: u64 = 1;
pub(crate) const MAX_POOL_SIZE: u64 = 20;
pub(crate) const MAX_RETRY_ATTEMPTS: u64 = u32::MAX as u64;

pub(super) fn check(config: &Value) -> Vec<String> {
    let Some(object) = config.as_object() else {
        return vec!["Provider configuration must be an object".to_string()];
    };

    let mut errors = Vec::new();

    for field in REQUIRED_FIELDS {
        if present(object, field).is_none() {
            errors.push(format!("Missing required field: {}", field));
        }
    }

    if let Some(connection) = present(object, "connection") {
        check_connection(connection, &mut errors);
    }

    if let Some(endpoint) = present(object, "apiEndpoint") {
        let parses = endpoint
            .as_str()
            .map(|s| Url::parse(s).is_ok())
            .unwrap_or(false);
        if !parses {
            errors.push("Invalid API endpoint URL".to_string());
        }
    }

    if let Some(auth) = present(object, "authentication") {
        check_authentication(auth, &mut errors);
    }

    if let Some(health) = present(object, "healthCheck") {
        check_health_settings(health, &mut errors);
    }

    errors
}

fn check_connection(connection: &Value, errors: &mut Vec<String>) {
    let Some(connection) = connection.as_object() else {
        errors.push("Connection settings must be an object".to_string());
        return;
    };

    if !as_number(present(connection, "timeout")).is_some_and(|t| t > 0.0) {
        errors.push("Connection timeout must be a positive number".to_string());
    }

    if let Some(pool_size) = present(connection, "poolSize") {
        let in_range = as_non_negative_integer(pool_size)
            .is_some_and(|n| (MIN_POOL_SIZE..=MAX_POOL_SIZE).contains(&n));
        if !in_range {
            errors.push(format!(
                "Connection pool size must be an integer between {} and {}",
                MIN_POOL_SIZE, MAX_POOL_SIZE
            ));
        }
    }

    if let Some(retries) = present(connection, "retryAttempts") {
        match as_non_negative_integer(retries) {
            None => errors.push("Retry attempts must be a non-negative integer".to_string()),
            Some(n) if n > MAX_RETRY_ATTEMPTS => errors.push(format!(
                "Retry attempts must not exceed {}",
                MAX_RETRY_ATTEMPTS
            )),
            Some(_) => {}
        }
    }
}

fn check_authentication(auth: &Value, errors: &mut Vec<String>) {
    let Some(auth) = auth.as_object() else {
        errors.push("Authentication settings must be an object".to_string());
        return;
    };

    let Some(kind) = present(auth, "type") else {
        errors.push("Authentication type is required".to_string());
        return;
    };

    match kind.as_str() {
        Some("apiKey") => require_credential(auth, "apiKey", "API key", "apiKey", errors),
        Some("bearer") => require_credential(auth, "token", "Token", "bearer", errors),
        Some("basic") => {
            require_credential(auth, "username", "Username", "basic", errors);
            require_credential(auth, "password", "Password", "basic", errors);
        }
        Some(other) => errors.push(format!("Unsupported authentication type: {}", other)),
        None => errors.push(format!("Unsupported authentication type: {}", kind)),
    }
}

fn require_credential(
    auth: &Map<String, Value>,
    field: &str,
    label: &str,
    kind: &str,
    errors: &mut Vec<String>,
) {
    if non_empty_str(auth.get(field)).is_none() {
        errors.push(format!("{} is required for {} authentication", label, kind));
    }
}

fn check_health_settings(health: &Value, errors: &mut Vec<String>) {
    let Some(health) = health.as_object() else {
        errors.push("Health check settings must be an object".to_string());
        return;
    };

    if !as_number(present(health, "interval")).is_some_and(|n| n > 0.0) {
        errors.push("Health check interval must be a positive number".to_string());
    }
    if !as_number(present(health, "timeout")).is_some_and(|n| n > 0.0) {
        errors.push("Health check timeout must be a positive number".to_string());
    }
}
