//! Example: registering a provider and observing its events
//!
//! This example shows how to:
//! - validate raw provider settings
//! - subscribe to provider events on a shared bus
//! - register, connect and health-check a provider through the registry

use async_trait::async_trait;
use ppa_core::chat::{ChatRequest, CompletionRequest, LLMResponse, TokenUsage};
use ppa_llm::{
    HealthCheckResult, LLMProvider, ModelInfo, ProviderCapabilities, ProviderConfig,
    ProviderEventBus, ProviderEventKind, ProviderLifecycle, ProviderRegistry, ProviderStatus,
    ProviderValidator, Result,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;

/// Echoes the prompt back; stands in for a local model server
struct EchoProvider {
    config: ProviderConfig,
    lifecycle: ProviderLifecycle,
}

#[async_trait]
impl LLMProvider for EchoProvider {
    fn id(&self) -> &str {
        self.lifecycle.provider_id()
    }

    fn name(&self) -> &str {
        "Echo"
    }

    async fn connect(&self) -> Result<()> {
        self.lifecycle.mark_connecting()?;
        self.lifecycle.mark_connected(Some("echo-1".to_string()))
    }

    async fn disconnect(&self) -> Result<()> {
        self.lifecycle.mark_disconnected()
    }

    async fn health_check(&self) -> Result<HealthCheckResult> {
        let started = Instant::now();
        let result = HealthCheckResult::healthy(started.elapsed())
            .with_details(json!({ "endpoint": self.config.api_endpoint }));
        self.lifecycle.record_health(&result);
        Ok(result)
    }

    async fn get_capabilities(&self) -> Result<ProviderCapabilities> {
        Ok(ProviderCapabilities {
            supported_models: vec!["echo-1".to_string()],
            ..ProviderCapabilities::default_capabilities()
        })
    }

    async fn get_available_models(&self) -> Result<Vec<ModelInfo>> {
        Ok(vec![ModelInfo::new("echo-1", self.id()).with_context_length(4096)])
    }

    fn get_status(&self) -> ProviderStatus {
        self.lifecycle.status()
    }

    async fn generate_completion(&self, request: CompletionRequest) -> Result<LLMResponse> {
        let tracker = self.lifecycle.begin_request(None);
        let words = request.prompt.split_whitespace().count() as u64;
        let usage = TokenUsage::new(words, words);
        tracker.complete(Some(usage));
        Ok(LLMResponse::new(request.prompt).with_usage(usage))
    }

    async fn generate_chat_completion(&self, request: ChatRequest) -> Result<LLMResponse> {
        let last = request.messages.last().map(|m| m.text().to_string()).unwrap_or_default();
        self.generate_completion(CompletionRequest::new(request.model, last))
            .await
    }
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // =========================================================================
    // Step 1: validate raw settings
    // =========================================================================
    println!("=== Step 1: Validate settings ===");

    let raw = json!({
        "apiEndpoint": "http://localhost:11434",
        "connection": { "timeout": 30000, "poolSize": 2 },
        "authentication": { "type": "bearer" }
    });
    let result = ProviderValidator::validate_config(&raw);
    println!("valid: {}, errors: {:?}", result.is_valid, result.errors);

    let config = ProviderConfig::new("http://localhost:11434").with_bearer_token("local-token");
    println!("typed config valid: {}", ProviderValidator::validate_provider_config(&config).is_valid);

    // =========================================================================
    // Step 2: subscribe to events
    // =========================================================================
    println!("\n=== Step 2: Subscribe ===");

    let bus = ProviderEventBus::new();
    for kind in ProviderEventKind::ALL {
        bus.on_provider_event(kind, |data| {
            println!("[{}] {} {}", data.timestamp, data.provider_id, data.kind());
        });
    }

    // =========================================================================
    // Step 3: register and use a provider
    // =========================================================================
    println!("\n=== Step 3: Register ===");

    let provider = Arc::new(EchoProvider {
        config,
        lifecycle: ProviderLifecycle::new("echo", bus.clone()),
    });
    let registry = ProviderRegistry::new(bus.clone());
    registry.register(provider.clone()).await?;
    registry.connect("echo").await?;

    let response = provider
        .generate_completion(CompletionRequest::new("echo-1", "hello from the example"))
        .await?;
    println!("response: {}", response.content);

    for (id, health) in registry.health_check_all().await {
        println!("{} healthy: {}", id, health.is_healthy);
    }

    registry.disconnect("echo").await?;
    registry.unregister("echo")?;

    Ok(())
}
