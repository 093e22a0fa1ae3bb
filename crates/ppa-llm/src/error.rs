use thiserror::Error;

use crate::provider::ConnectionState;

/// Unified error type for provider operations
#[derive(Error, Debug)]
pub enum LLMError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("provider error: {0}")]
    Provider(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("provider not found: {0}")]
    ProviderNotFound(String),

    #[error("provider already registered: {0}")]
    AlreadyRegistered(String),

    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("invalid state transition: {from} -> {to}")]
    InvalidStateTransition {
        from: ConnectionState,
        to: ConnectionState,
    },

    #[error("unsupported operation: {0}")]
    Unsupported(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LLMError>;

/// Best-effort text of a caught panic payload
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
