pub mod config;
pub mod health;
pub mod lifecycle;
pub mod metadata;
pub mod status;

pub use config::{AuthConfig, ConnectionSettings, HealthCheckSettings, ProviderConfig};
pub use health::HealthCheckResult;
pub use lifecycle::{ProviderLifecycle, RequestTracker};
pub use metadata::{LLMProvider, LLMStream, ModelInfo, ProviderCapabilities};
pub use status::{ConnectionState, ProviderStatus};
