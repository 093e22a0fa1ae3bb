#![allow(dead_code)]

use async_trait::async_trait;
use ppa_core::chat::{ChatChunk, ChatRequest, CompletionRequest, LLMResponse, TokenUsage};
use ppa_llm::{
    HealthCheckResult, LLMError, LLMProvider, LLMStream, ModelInfo, ProviderCapabilities,
    ProviderEventBus, ProviderLifecycle, ProviderStatus, Result,
};
use std::time::Duration;

/// How a mock call behaves
#[derive(Debug, Clone)]
pub enum Behavior {
    Succeed,
    Fail(String),
    Panic(String),
}

/// Mock LLM Provider for testing
pub struct MockLLMProvider {
    id: String,
    lifecycle: ProviderLifecycle,
    responses: Vec<ChatChunk>,
    capabilities: Behavior,
    health: Behavior,
    connect: Behavior,
    health_result: Option<HealthCheckResult>,
    id_panic: Option<String>,
}

impl MockLLMProvider {
    pub fn new(id: &str, bus: ProviderEventBus) -> Self {
        Self {
            id: id.to_string(),
            lifecycle: ProviderLifecycle::new(id, bus),
            responses: Vec::new(),
            capabilities: Behavior::Succeed,
            health: Behavior::Succeed,
            connect: Behavior::Succeed,
            health_result: None,
            id_panic: None,
        }
    }

    /// Create a simple text response mock
    pub fn with_text_response(id: &str, bus: ProviderEventBus, text: &str) -> Self {
        let mut mock = Self::new(id, bus);
        mock.responses = text
            .chars()
            .map(|c| ChatChunk::content(c.to_string()))
            .collect();
        mock
    }

    pub fn capabilities_behavior(mut self, behavior: Behavior) -> Self {
        self.capabilities = behavior;
        self
    }

    pub fn health_behavior(mut self, behavior: Behavior) -> Self {
        self.health = behavior;
        self
    }

    pub fn connect_behavior(mut self, behavior: Behavior) -> Self {
        self.connect = behavior;
        self
    }

    /// Return this exact result from `health_check`
    pub fn health_result(mut self, result: HealthCheckResult) -> Self {
        self.health_result = Some(result);
        self
    }

    /// Make `id()` panic with this message
    pub fn panicking_id(mut self, message: &str) -> Self {
        self.id_panic = Some(message.to_string());
        self
    }

    pub fn lifecycle(&self) -> &ProviderLifecycle {
        &self.lifecycle
    }

    fn run<T>(&self, behavior: &Behavior, value: impl FnOnce() -> T) -> Result<T> {
        match behavior {
            Behavior::Succeed => Ok(value()),
            Behavior::Fail(message) => Err(LLMError::Provider(message.clone())),
            Behavior::Panic(message) => panic!("{}", message),
        }
    }

    fn text(&self) -> String {
        self.responses
            .iter()
            .filter_map(|chunk| match chunk {
                ChatChunk::Content { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl LLMProvider for MockLLMProvider {
    fn id(&self) -> &str {
        if let Some(message) = &self.id_panic {
            panic!("{}", message);
        }
        &self.id
    }

    fn name(&self) -> &str {
        "Mock Provider"
    }

    async fn connect(&self) -> Result<()> {
        self.lifecycle.mark_connecting()?;
        match self.run(&self.connect, || ()) {
            Ok(()) => self.lifecycle.mark_connected(Some("mock-model".to_string())),
            Err(e) => {
                let message = e.to_string();
                self.lifecycle.mark_error(e)?;
                Err(LLMError::Connection(message))
            }
        }
    }

    async fn disconnect(&self) -> Result<()> {
        self.lifecycle.mark_disconnected()
    }

    async fn health_check(&self) -> Result<HealthCheckResult> {
        let result = self.run(&self.health, || {
            self.health_result
                .clone()
                .unwrap_or_else(|| HealthCheckResult::healthy(Duration::from_millis(5)))
        })?;
        self.lifecycle.record_health(&result);
        Ok(result)
    }

    async fn get_capabilities(&self) -> Result<ProviderCapabilities> {
        self.run(&self.capabilities, || {
            ProviderCapabilities::all(vec!["mock-model".to_string()], 8192)
        })
    }

    async fn get_available_models(&self) -> Result<Vec<ModelInfo>> {
        Ok(vec![ModelInfo::new("mock-model", &self.id).with_context_length(8192)])
    }

    fn get_status(&self) -> ProviderStatus {
        self.lifecycle.status()
    }

    async fn generate_completion(&self, request: CompletionRequest) -> Result<LLMResponse> {
        let tracker = self.lifecycle.begin_request(None);
        let usage = TokenUsage::new(request.prompt.len() as u64, self.responses.len() as u64);
        tracker.complete(Some(usage));
        Ok(LLMResponse::new(self.text())
            .with_model(request.model)
            .with_usage(usage))
    }

    async fn generate_chat_completion(&self, request: ChatRequest) -> Result<LLMResponse> {
        let tracker = self.lifecycle.begin_request(None);
        let usage = TokenUsage::new(request.messages.len() as u64, self.responses.len() as u64);
        tracker.complete(Some(usage));
        Ok(LLMResponse::new(self.text())
            .with_model(request.model)
            .with_usage(usage))
    }

    async fn stream_chat_completion(&self, _request: ChatRequest) -> Result<LLMStream> {
        let responses = self.responses.clone();
        let stream = futures::stream::iter(responses.into_iter().map(Ok));
        Ok(Box::pin(stream))
    }
}
