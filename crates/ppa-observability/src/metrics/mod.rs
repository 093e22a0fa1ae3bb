//! 指标收集模块
//!
//! 提供基于 metrics 库的指标收集功能。

pub mod provider;

use metrics::{describe_counter, describe_gauge, describe_histogram, Unit};
#[cfg(feature = "prometheus")]
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::config::{Config, MetricsConfig};
use crate::error::Result;
#[cfg(feature = "prometheus")]
use crate::error::ObservabilityError;

pub use provider::{PendingRequest, ProviderMetricsCollector};

/// 请求总数
pub const PROVIDER_REQUESTS_TOTAL: &str = "ppa_provider_requests_total";
/// 成功请求数
pub const PROVIDER_REQUESTS_SUCCEEDED: &str = "ppa_provider_requests_succeeded_total";
/// 失败请求数
pub const PROVIDER_REQUESTS_FAILED: &str = "ppa_provider_requests_failed_total";
/// Token 消耗
pub const PROVIDER_TOKENS_TOTAL: &str = "ppa_provider_tokens_total";
/// 请求耗时
pub const PROVIDER_REQUEST_DURATION: &str = "ppa_provider_request_duration_seconds";
/// 最近一次健康检查结果
pub const PROVIDER_HEALTHY: &str = "ppa_provider_healthy";
/// Provider 错误数
pub const PROVIDER_ERRORS_TOTAL: &str = "ppa_provider_errors_total";

/// 指标收集器
pub struct MetricsCollector {
    /// Prometheus 句柄
    #[cfg(feature = "prometheus")]
    handle: Option<PrometheusHandle>,

    /// 配置
    config: MetricsConfig,

    /// 是否已初始化
    initialized: bool,
}

impl std::fmt::Debug for MetricsCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsCollector")
            .field("config", &self.config)
            .field("initialized", &self.initialized)
            .finish()
    }
}

impl MetricsCollector {
    /// 创建新的指标收集器
    pub async fn new(config: &Config) -> Result<Self> {
        let mut collector = Self {
            #[cfg(feature = "prometheus")]
            handle: None,
            config: config.metrics.clone(),
            initialized: false,
        };

        collector.init()?;

        Ok(collector)
    }

    /// 初始化指标收集器
    fn init(&mut self) -> Result<()> {
        if !self.config.enabled {
            return Ok(());
        }

        #[cfg(feature = "prometheus")]
        if self.config.prometheus_enabled {
            let recorder = PrometheusBuilder::new().build_recorder();
            let handle = recorder.handle();

            metrics::set_global_recorder(recorder).map_err(|e| {
                ObservabilityError::metrics(format!("Failed to set global recorder: {}", e))
            })?;

            self.handle = Some(handle);
        }

        register_descriptions();

        self.initialized = true;

        tracing::info!(
            target: "ppa_observability",
            "Metrics collector initialized"
        );

        Ok(())
    }

    /// 是否已初始化
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// 获取 Prometheus 格式的指标
    pub fn render(&self) -> String {
        #[cfg(feature = "prometheus")]
        {
            self.handle
                .as_ref()
                .map(|h| h.render())
                .unwrap_or_default()
        }
        #[cfg(not(feature = "prometheus"))]
        {
            String::new()
        }
    }
}

/// 注册 provider 指标描述
fn register_descriptions() {
    describe_counter!(
        PROVIDER_REQUESTS_TOTAL,
        Unit::Count,
        "Total number of provider requests"
    );
    describe_counter!(
        PROVIDER_REQUESTS_SUCCEEDED,
        Unit::Count,
        "Provider requests that completed"
    );
    describe_counter!(
        PROVIDER_REQUESTS_FAILED,
        Unit::Count,
        "Provider requests that failed"
    );
    describe_counter!(
        PROVIDER_TOKENS_TOTAL,
        Unit::Count,
        "Tokens consumed by provider requests"
    );
    describe_histogram!(
        PROVIDER_REQUEST_DURATION,
        Unit::Seconds,
        "Provider request duration in seconds"
    );
    describe_gauge!(
        PROVIDER_HEALTHY,
        "1 when the last health check passed, 0 otherwise"
    );
    describe_counter!(
        PROVIDER_ERRORS_TOTAL,
        Unit::Count,
        "Provider error events"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_collector_renders_nothing() {
        let config = Config::default().with_metrics(false);
        let collector = MetricsCollector::new(&config).await.unwrap();
        assert!(!collector.is_initialized());
        assert!(collector.render().is_empty());
    }

    #[cfg(feature = "prometheus")]
    #[tokio::test]
    async fn test_prometheus_render() {
        // The only test in this crate that installs the global recorder
        let collector = MetricsCollector::new(&Config::default()).await.unwrap();
        metrics::counter!(PROVIDER_REQUESTS_TOTAL, "provider" => "ollama").increment(1);

        let output = collector.render();
        assert!(output.contains(PROVIDER_REQUESTS_TOTAL));
    }
}
