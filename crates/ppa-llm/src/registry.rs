//! Provider registry backed by a concurrent map

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{LLMError, Result};
use crate::events::ProviderEventBus;
use crate::provider::{HealthCheckResult, LLMProvider};
use crate::validation::{ProviderValidator, ValidationResult};

/// Owns the registered providers
///
/// The registry publishes `Initialized` and `Destroyed` when providers come and
/// go. Connection, error and health events are published by the providers
/// themselves through their [`ProviderLifecycle`](crate::ProviderLifecycle),
/// so each transition reaches the bus once.
#[derive(Clone)]
pub struct ProviderRegistry {
    providers: Arc<DashMap<String, Arc<dyn LLMProvider>>>,
    bus: ProviderEventBus,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.list_ids())
            .finish()
    }
}

impl ProviderRegistry {
    pub fn new(bus: ProviderEventBus) -> Self {
        Self {
            providers: Arc::new(DashMap::new()),
            bus,
        }
    }

    pub fn bus(&self) -> &ProviderEventBus {
        &self.bus
    }

    /// Validate and store a provider
    ///
    /// Invalid providers are rejected with [`LLMError::Validation`] and never
    /// stored.
    pub async fn register(&self, provider: Arc<dyn LLMProvider>) -> Result<ValidationResult> {
        let id = provider.id().to_string();
        if self.providers.contains_key(&id) {
            return Err(LLMError::AlreadyRegistered(id));
        }

        let result = ProviderValidator::validate_provider(provider.as_ref()).await;
        if !result.is_valid {
            warn!(provider_id = %id, "Rejected invalid provider");
            return Err(LLMError::Validation(result.errors));
        }

        match self.providers.entry(id.clone()) {
            Entry::Occupied(_) => return Err(LLMError::AlreadyRegistered(id)),
            Entry::Vacant(slot) => {
                slot.insert(provider.clone());
            }
        }

        info!(provider_id = %id, name = provider.name(), "Provider registered");
        self.bus.emit_provider_init(
            &id,
            Some(serde_json::json!({ "name": provider.name() })),
        );
        Ok(result)
    }

    pub fn unregister(&self, id: &str) -> Result<Arc<dyn LLMProvider>> {
        let (_, provider) = self
            .providers
            .remove(id)
            .ok_or_else(|| LLMError::ProviderNotFound(id.to_string()))?;
        debug!(provider_id = %id, "Provider unregistered");
        self.bus.emit_provider_destroy(id, None);
        Ok(provider)
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn LLMProvider>> {
        self.providers.get(id).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.providers.contains_key(id)
    }

    /// Registered ids, sorted
    pub fn list_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.providers.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub async fn connect(&self, id: &str) -> Result<()> {
        let provider = self.require(id)?;
        provider.connect().await.map_err(|e| {
            warn!(provider_id = %id, error = %e, "Provider failed to connect");
            LLMError::Connection(e.to_string())
        })?;
        debug!(provider_id = %id, "Provider connected through registry");
        Ok(())
    }

    pub async fn disconnect(&self, id: &str) -> Result<()> {
        let provider = self.require(id)?;
        provider.disconnect().await.map_err(|e| {
            warn!(provider_id = %id, error = %e, "Provider failed to disconnect");
            LLMError::Provider(e.to_string())
        })
    }

    /// Probe every registered provider
    ///
    /// A failing probe is reported as an unhealthy result rather than an error.
    pub async fn health_check_all(&self) -> HashMap<String, HealthCheckResult> {
        let providers: Vec<(String, Arc<dyn LLMProvider>)> = self
            .providers
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();

        let mut results = HashMap::with_capacity(providers.len());
        for (id, provider) in providers {
            let result = match provider.health_check().await {
                Ok(result) => result,
                Err(e) => {
                    warn!(provider_id = %id, error = %e, "Health check failed");
                    HealthCheckResult::unhealthy(e.to_string())
                }
            };

            let validation = ProviderValidator::validate_health_result(&result);
            if !validation.is_valid {
                warn!(provider_id = %id, errors = ?validation.errors, "Malformed health check result");
            }

            results.insert(id, result);
        }
        results
    }

    fn require(&self, id: &str) -> Result<Arc<dyn LLMProvider>> {
        self.get(id)
            .ok_or_else(|| LLMError::ProviderNotFound(id.to_string()))
    }
}
