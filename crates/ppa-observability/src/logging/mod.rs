//! 结构化日志模块
//!
//! 提供基于 tracing 的结构化日志功能。

use std::sync::Arc;

use parking_lot::RwLock;
use tracing_subscriber::{
    layer::SubscriberExt,
    reload::{self, Handle},
    util::SubscriberInitExt,
    EnvFilter, Registry,
};

use crate::config::{Config, LoggingConfig};
use crate::error::{ObservabilityError, Result};

/// 日志级别重新加载句柄类型
type ReloadHandle = Handle<EnvFilter, Registry>;

/// 日志管理器
#[derive(Debug)]
pub struct LogManager {
    /// 配置
    config: LoggingConfig,

    /// 过滤器重新加载句柄；全局订阅者已被其他组件安装时为 `None`
    reload_handle: Option<Arc<RwLock<ReloadHandle>>>,
}

impl LogManager {
    /// 创建新的日志管理器并安装全局订阅者
    pub async fn new(config: &Config) -> Result<Self> {
        let mut manager = Self {
            config: config.logging.clone(),
            reload_handle: None,
        };

        manager.init()?;

        Ok(manager)
    }

    /// 初始化日志系统
    fn init(&mut self) -> Result<()> {
        let filter = build_filter(&self.config.level, &self.config)?;
        let (filter, reload_handle) = reload::Layer::new(filter);

        let registry = tracing_subscriber::registry().with(filter);

        let installed = if self.config.json_format {
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_target(self.config.include_target)
                .with_thread_ids(self.config.include_thread_id)
                .with_line_number(self.config.include_line_number)
                .with_file(true)
                .with_ansi(self.config.ansi_colors);

            registry.with(layer).try_init()
        } else {
            let layer = tracing_subscriber::fmt::layer()
                .with_target(self.config.include_target)
                .with_thread_ids(self.config.include_thread_id)
                .with_line_number(self.config.include_line_number)
                .with_file(true)
                .with_ansi(self.config.ansi_colors);

            registry.with(layer).try_init()
        };

        match installed {
            Ok(()) => {
                self.reload_handle = Some(Arc::new(RwLock::new(reload_handle)));
                tracing::info!(
                    target: "ppa_observability",
                    "Log manager initialized with level: {}",
                    self.config.level
                );
            }
            Err(e) => {
                tracing::warn!(
                    target: "ppa_observability",
                    "Global subscriber already installed, keeping it: {}",
                    e
                );
            }
        }

        Ok(())
    }

    /// 是否由本管理器安装了全局订阅者
    pub fn is_installed(&self) -> bool {
        self.reload_handle.is_some()
    }

    /// 动态更新日志级别
    pub fn update_level(&mut self, level: &str) -> Result<()> {
        let new_filter = build_filter(level, &self.config)?;

        let Some(ref handle) = self.reload_handle else {
            return Err(ObservabilityError::logging("Log manager not initialized"));
        };

        handle
            .write()
            .modify(|filter| {
                *filter = new_filter;
            })
            .map_err(|e| ObservabilityError::logging(format!("Failed to update log level: {}", e)))?;

        self.config.level = level.to_string();

        tracing::info!(
            target: "ppa_observability",
            "Log level updated to: {}",
            level
        );

        Ok(())
    }

    /// 获取当前配置
    pub fn config(&self) -> &LoggingConfig {
        &self.config
    }
}

/// 构建环境过滤器，模块级别覆盖基础级别
fn build_filter(level: &str, config: &LoggingConfig) -> Result<EnvFilter> {
    let mut filter = EnvFilter::try_new(level)
        .map_err(|e| ObservabilityError::logging(format!("Invalid log level: {}", e)))?;

    for (module, module_level) in &config.module_levels {
        filter = filter.add_directive(
            format!("{}={}", module, module_level)
                .parse()
                .map_err(|e| ObservabilityError::logging(format!("Invalid directive: {}", e)))?,
        );
    }

    Ok(filter)
}

/// 创建带有 provider 上下文的 span
pub fn create_provider_span(provider_id: &str) -> tracing::Span {
    tracing::info_span!(
        "provider",
        provider_id = %provider_id,
    )
}

/// 创建带有请求上下文的 span
pub fn create_request_span(provider_id: &str, request_id: &str) -> tracing::Span {
    tracing::info_span!(
        "request",
        provider_id = %provider_id,
        request_id = %request_id,
    )
}
