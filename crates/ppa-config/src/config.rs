use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;

/// 主配置结构体
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PpaConfig {
    pub version: String,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl Default for PpaConfig {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            llm: LlmConfig::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl PpaConfig {
    /// 获取配置值的快捷方法
    ///
    /// `llm.providers.<id>` 返回该 provider 的原始 JSON。
    pub fn get_value(&self, key: &str) -> Option<String> {
        let parts: Vec<&str> = key.split('.').collect();
        match parts.as_slice() {
            ["version"] => Some(self.version.clone()),
            ["llm", "default_provider"] => Some(self.llm.default_provider.clone()),
            ["llm", "providers", id] => self.llm.providers.get(*id).map(Value::to_string),
            ["llm", "providers", id, "apiEndpoint"] => self
                .llm
                .providers
                .get(*id)
                .and_then(|p| p.get("apiEndpoint"))
                .and_then(Value::as_str)
                .map(str::to_string),
            ["logging", "level"] => Some(self.logging.level.as_str().to_string()),
            ["logging", "json_format"] => Some(self.logging.json_format.to_string()),
            _ => None,
        }
    }

    /// 设置配置值
    pub fn set_value(&mut self, key: &str, value: &str) -> ConfigResult<()> {
        let parts: Vec<&str> = key.split('.').collect();
        match parts.as_slice() {
            ["llm", "default_provider"] => {
                self.llm.default_provider = value.to_string();
            }
            ["llm", "providers", id] => {
                let settings: Value = serde_json::from_str(value)?;
                self.llm.providers.insert(id.to_string(), settings);
            }
            ["llm", "providers", id, "apiEndpoint"] => {
                let settings = self
                    .llm
                    .providers
                    .get_mut(*id)
                    .and_then(Value::as_object_mut)
                    .ok_or_else(|| ConfigError::ProviderNotFound(id.to_string()))?;
                settings.insert("apiEndpoint".to_string(), Value::String(value.to_string()));
            }
            ["logging", "level"] => {
                self.logging.level = value.parse()?;
            }
            ["logging", "json_format"] => {
                self.logging.json_format = value.parse().map_err(|_| {
                    ConfigError::Validation(format!("Invalid boolean: {}", value))
                })?;
            }
            _ => return Err(ConfigError::KeyNotFound(key.to_string())),
        }
        Ok(())
    }
}

/// LLM 配置
///
/// Provider 设置保持宿主存储的原始 JSON 形式，加载时逐个校验。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LlmConfig {
    pub default_provider: String,
    pub providers: HashMap<String, Value>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        let mut providers = HashMap::new();

        // Local Ollama server
        providers.insert(
            "ollama".to_string(),
            json!({
                "apiEndpoint": "http://localhost:11434",
                "connection": { "timeout": 30000, "retryAttempts": 2 },
                "healthCheck": { "interval": 60000, "timeout": 5000 }
            }),
        );

        // Local LM Studio server
        providers.insert(
            "lmstudio".to_string(),
            json!({
                "apiEndpoint": "http://localhost:1234",
                "connection": { "timeout": 30000 }
            }),
        );

        Self {
            default_provider: "ollama".to_string(),
            providers,
        }
    }
}

/// 日志级别
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> ConfigResult<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(ConfigError::Validation(format!("Invalid log level: {}", s))),
        }
    }
}

/// Logging 配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct LoggingSettings {
    #[serde(default)]
    pub level: LogLevel,
    #[serde(default)]
    pub json_format: bool,
    #[serde(default)]
    pub module_levels: HashMap<String, String>,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Provider not found: {0}")]
    ProviderNotFound(String),

    #[error("Watch error: {0}")]
    #[cfg(feature = "hot-reload")]
    Watch(#[from] notify::Error),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
