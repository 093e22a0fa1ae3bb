use async_trait::async_trait;
use futures::Stream;
use ppa_core::chat::{ChatChunk, ChatRequest, CompletionRequest, LLMResponse};
use serde::{Deserialize, Serialize};
use std::pin::Pin;

use crate::error::{LLMError, Result};
use crate::provider::{HealthCheckResult, ProviderStatus};

/// Type alias for a streamed provider response
pub type LLMStream = Pin<Box<dyn Stream<Item = Result<ChatChunk>> + Send>>;

/// LLM Provider trait
///
/// Every concrete provider (Ollama, LM Studio, ...) implements this contract.
/// The registry owns provider instances; the validator and the event bus only
/// borrow them.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Stable provider ID
    fn id(&self) -> &str;

    /// Human-readable name
    fn name(&self) -> &str;

    /// Open the connection to the backend
    async fn connect(&self) -> Result<()>;

    /// Close the connection
    async fn disconnect(&self) -> Result<()>;

    /// Probe the backend
    async fn health_check(&self) -> Result<HealthCheckResult>;

    /// Declared feature set
    async fn get_capabilities(&self) -> Result<ProviderCapabilities>;

    /// Models the backend currently serves
    async fn get_available_models(&self) -> Result<Vec<ModelInfo>>;

    /// Current connection status
    fn get_status(&self) -> ProviderStatus;

    /// Single-prompt completion
    async fn generate_completion(&self, request: CompletionRequest) -> Result<LLMResponse>;

    /// Chat completion
    async fn generate_chat_completion(&self, request: ChatRequest) -> Result<LLMResponse>;

    /// Streamed single-prompt completion
    async fn stream_completion(&self, _request: CompletionRequest) -> Result<LLMStream> {
        Err(LLMError::Unsupported(format!("{} does not stream completions", self.id())))
    }

    /// Streamed chat completion
    async fn stream_chat_completion(&self, _request: ChatRequest) -> Result<LLMStream> {
        Err(LLMError::Unsupported(format!("{} does not stream chat completions", self.id())))
    }
}

/// Provider capabilities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderCapabilities {
    /// Model names the provider can serve
    pub supported_models: Vec<String>,
    /// Supports streaming responses
    pub supports_streaming: bool,
    /// Supports chat-style message lists
    pub supports_chat_completion: bool,
    /// Honors a system prompt
    pub supports_system_prompts: bool,
    /// Largest context window in tokens
    pub max_context_length: u64,
}

impl ProviderCapabilities {
    /// Chat + system prompts, no streaming, 4k context
    pub fn default_capabilities() -> Self {
        Self {
            supported_models: Vec::new(),
            supports_streaming: false,
            supports_chat_completion: true,
            supports_system_prompts: true,
            max_context_length: 4096,
        }
    }

    /// Enable everything for the given models
    pub fn all(models: Vec<String>, max_context_length: u64) -> Self {
        Self {
            supported_models: models,
            supports_streaming: true,
            supports_chat_completion: true,
            supports_system_prompts: true,
            max_context_length,
        }
    }

    pub fn supports_model(&self, model: &str) -> bool {
        self.supported_models.iter().any(|m| m == model)
    }
}

impl Default for ProviderCapabilities {
    fn default() -> Self {
        Self::default_capabilities()
    }
}

/// Description of a model served by a provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ModelInfo {
    pub fn new(id: impl Into<String>, provider: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            provider: provider.into(),
            context_length: None,
            description: None,
        }
    }

    pub fn with_context_length(mut self, context_length: u64) -> Self {
        self.context_length = Some(context_length);
        self
    }
}
