pub mod error;
pub mod events;
pub mod provider;
pub mod registry;
pub mod validation;

// Re-export core types
pub use error::{LLMError, Result};
pub use events::{
    ListenerId, ProviderEvent, ProviderEventBus, ProviderEventData, ProviderEventKind,
    ProviderMetrics, SharedError,
};
pub use provider::{
    AuthConfig, ConnectionSettings, ConnectionState, HealthCheckResult, HealthCheckSettings,
    LLMProvider, LLMStream, ModelInfo, ProviderCapabilities, ProviderConfig, ProviderLifecycle,
    ProviderStatus, RequestTracker,
};
pub use registry::ProviderRegistry;
pub use validation::{ProviderValidator, ValidationResult};
