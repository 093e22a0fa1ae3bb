//! Copilot PPA Observability Infrastructure
//!
//! 提供统一的日志和 provider 指标功能。

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;

pub use config::Config;
pub use error::{ObservabilityError, Result};
pub use logging::{create_provider_span, create_request_span, LogManager};
pub use metrics::{MetricsCollector, PendingRequest, ProviderMetricsCollector};

use parking_lot::RwLock;
use ppa_llm::ProviderEventBus;
use std::sync::Arc;

/// 统一的观测性句柄
#[derive(Debug)]
pub struct Observability {
    /// 日志管理器
    log_manager: Arc<RwLock<LogManager>>,
    /// 指标收集器
    metrics: Arc<MetricsCollector>,
    /// Provider 事件订阅者
    provider_metrics: Arc<ProviderMetricsCollector>,
    /// 配置
    config: Config,
}

impl Observability {
    /// 初始化观测性基础设施并订阅 provider 事件
    pub async fn init(config: Config, bus: &ProviderEventBus) -> Result<Self> {
        // 初始化日志系统
        let log_manager = Arc::new(RwLock::new(LogManager::new(&config).await?));

        // 初始化指标收集器
        let metrics = Arc::new(MetricsCollector::new(&config).await?);

        let provider_metrics = Arc::new(ProviderMetricsCollector::attach(bus));

        tracing::info!(
            target: "ppa_observability",
            app = %config.app_name,
            environment = %config.environment,
            "Observability infrastructure initialized"
        );

        Ok(Self {
            log_manager,
            metrics,
            provider_metrics,
            config,
        })
    }

    /// 获取日志管理器
    pub fn log_manager(&self) -> Arc<RwLock<LogManager>> {
        Arc::clone(&self.log_manager)
    }

    /// 获取指标收集器
    pub fn metrics(&self) -> Arc<MetricsCollector> {
        Arc::clone(&self.metrics)
    }

    /// 获取 provider 指标订阅者
    pub fn provider_metrics(&self) -> Arc<ProviderMetricsCollector> {
        Arc::clone(&self.provider_metrics)
    }

    /// 获取配置
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 动态更新日志级别
    pub async fn update_log_level(&self, level: &str) -> Result<()> {
        self.log_manager.write().update_level(level)
    }

    /// 优雅关闭
    pub async fn shutdown(self) -> Result<()> {
        tracing::info!(
            target: "ppa_observability",
            "Shutting down observability infrastructure"
        );

        self.provider_metrics.detach();

        Ok(())
    }
}

/// 便捷导入模块
pub mod prelude {
    //! 常用类型的便捷导入

    pub use crate::{Config, Observability, ProviderMetricsCollector, Result};

    // 日志
    pub use tracing::{debug, error, info, instrument, trace, warn, Span};

    // 指标
    pub use metrics::{counter, gauge, histogram};
}
