use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};
use std::time::Duration;

use crate::error::{LLMError, Result};
use crate::validation::ProviderValidator;

/// Authentication configuration, tagged by `type` as in the host settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AuthConfig {
    /// API key sent with every request
    #[serde(rename = "apiKey")]
    ApiKey {
        #[serde(rename = "apiKey")]
        api_key: String,
    },
    /// Bearer token authentication
    #[serde(rename = "bearer")]
    Bearer { token: String },
    /// HTTP basic authentication
    #[serde(rename = "basic")]
    Basic { username: String, password: String },
}

impl AuthConfig {
    /// The `type` tag as it appears in settings
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ApiKey { .. } => "apiKey",
            Self::Bearer { .. } => "bearer",
            Self::Basic { .. } => "basic",
        }
    }
}

/// Connection settings; all durations are milliseconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionSettings {
    #[serde(deserialize_with = "deserialize_millis")]
    pub timeout: u64,
    #[serde(
        default,
        deserialize_with = "deserialize_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub pool_size: Option<u32>,
    #[serde(
        default,
        deserialize_with = "deserialize_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub retry_attempts: Option<u32>,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            timeout: default_timeout_ms(),
            pool_size: None,
            retry_attempts: None,
        }
    }
}

/// Periodic health check settings (milliseconds)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthCheckSettings {
    #[serde(deserialize_with = "deserialize_millis")]
    pub interval: u64,
    #[serde(deserialize_with = "deserialize_millis")]
    pub timeout: u64,
}

impl HealthCheckSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout)
    }
}

/// Provider configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    /// Base URL of the provider API
    pub api_endpoint: String,
    /// Connection settings
    #[serde(default)]
    pub connection: ConnectionSettings,
    /// Authentication configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication: Option<AuthConfig>,
    /// Health check schedule
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_check: Option<HealthCheckSettings>,
}

impl ProviderConfig {
    /// Create a new provider config
    pub fn new(api_endpoint: impl Into<String>) -> Self {
        Self {
            api_endpoint: api_endpoint.into(),
            connection: ConnectionSettings::default(),
            authentication: None,
            health_check: None,
        }
    }

    /// Validate raw settings and convert them into a typed config
    pub fn from_json(value: &Value) -> Result<Self> {
        let result = ProviderValidator::validate_config(value);
        if !result.is_valid {
            return Err(LLMError::Validation(result.errors));
        }
        Ok(serde_json::from_value(value.clone())?)
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.connection.timeout = timeout.as_millis() as u64;
        self
    }

    /// Set connection pool size
    pub fn with_pool_size(mut self, pool_size: u32) -> Self {
        self.connection.pool_size = Some(pool_size);
        self
    }

    /// Set retry attempts
    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.connection.retry_attempts = Some(attempts);
        self
    }

    /// Set API key
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.authentication = Some(AuthConfig::ApiKey { api_key: api_key.into() });
        self
    }

    /// Set bearer token
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.authentication = Some(AuthConfig::Bearer { token: token.into() });
        self
    }

    /// Set basic credentials
    pub fn with_basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.authentication = Some(AuthConfig::Basic {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    /// Enable periodic health checks
    pub fn with_health_check(mut self, interval: Duration, timeout: Duration) -> Self {
        self.health_check = Some(HealthCheckSettings {
            interval: interval.as_millis() as u64,
            timeout: timeout.as_millis() as u64,
        });
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.connection.timeout)
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self::new("http://localhost:11434")
    }
}

fn default_timeout_ms() -> u64 {
    30_000
}

/// Millisecond settings accept any non-negative number; fractions round up
fn deserialize_millis<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let number = Number::deserialize(deserializer)?;
    if let Some(millis) = number.as_u64() {
        return Ok(millis);
    }
    match number.as_f64() {
        Some(millis) if millis.is_finite() && millis >= 0.0 => Ok(millis.ceil() as u64),
        _ => Err(D::Error::custom(format!(
            "invalid millisecond value: {}",
            number
        ))),
    }
}

/// Counts accept integral floats such as `5.0`
fn deserialize_count<'de, D>(deserializer: D) -> std::result::Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(number) = Option::<Number>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let count = number.as_u64().or_else(|| {
        number
            .as_f64()
            .filter(|n| n.is_finite() && *n >= 0.0 && n.fract() == 0.0 && *n <= u32::MAX as f64)
            .map(|n| n as u64)
    });
    count
        .and_then(|n| u32::try_from(n).ok())
        .map(Some)
        .ok_or_else(|| D::Error::custom(format!("invalid count: {}", number)))
}
