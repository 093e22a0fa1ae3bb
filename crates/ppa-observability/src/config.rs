//! 配置管理模块
//!
//! 支持从环境变量、JSON 配置文件读取观测性配置。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::{ObservabilityError, Result};

/// 观测性配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// 应用名称
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// 环境（development, staging, production）
    #[serde(default = "default_environment")]
    pub environment: String,

    /// 日志配置
    #[serde(default)]
    pub logging: LoggingConfig,

    /// 指标配置
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            environment: default_environment(),
            logging: LoggingConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 识别 `PPA_LOG_LEVEL`、`PPA_LOG_FORMAT`（`json` 或 `text`）和
    /// `PPA_ENVIRONMENT`。
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(level) = std::env::var("PPA_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Ok(format) = std::env::var("PPA_LOG_FORMAT") {
            config.logging.json_format = format.eq_ignore_ascii_case("json");
        }
        if let Ok(environment) = std::env::var("PPA_ENVIRONMENT") {
            config.environment = environment;
        }
        config
    }

    /// 从 JSON 文件加载配置
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => {}
            _ => return Err(ObservabilityError::config("Unsupported config file format")),
        }

        let content = std::fs::read_to_string(&path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// 设置日志级别
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.logging.level = level.into();
        self
    }

    /// 设置是否使用 JSON 格式
    pub fn with_json_format(mut self, json: bool) -> Self {
        self.logging.json_format = json;
        self
    }

    /// 添加模块特定的日志级别
    pub fn with_module_level(mut self, module: impl Into<String>, level: impl Into<String>) -> Self {
        self.logging.module_levels.insert(module.into(), level.into());
        self
    }

    /// 启用或禁用指标收集
    pub fn with_metrics(mut self, enabled: bool) -> Self {
        self.metrics.enabled = enabled;
        self
    }

    /// 启用或禁用 Prometheus 导出器
    pub fn with_prometheus(mut self, enabled: bool) -> Self {
        self.metrics.prometheus_enabled = enabled;
        self
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别（trace, debug, info, warn, error）
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否使用 JSON 格式
    #[serde(default = "default_false")]
    pub json_format: bool,

    /// 模块级别的日志配置
    #[serde(default)]
    pub module_levels: HashMap<String, String>,

    /// 是否启用 ANSI 颜色
    #[serde(default = "default_true")]
    pub ansi_colors: bool,

    /// 是否包含目标（target）
    #[serde(default = "default_true")]
    pub include_target: bool,

    /// 是否包含线程 ID
    #[serde(default = "default_false")]
    pub include_thread_id: bool,

    /// 是否包含行号
    #[serde(default = "default_true")]
    pub include_line_number: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
            module_levels: HashMap::new(),
            ansi_colors: true,
            include_target: true,
            include_thread_id: false,
            include_line_number: true,
        }
    }
}

/// 指标配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// 是否启用指标收集
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// 是否启用 Prometheus 导出器
    #[serde(default = "default_true")]
    pub prometheus_enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            prometheus_enabled: true,
        }
    }
}

// 默认值函数
fn default_app_name() -> String {
    "copilot-ppa".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_log_level() -> String {
    std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string())
}

fn default_true() -> bool {
    true
}

fn default_false() -> bool {
    false
}
