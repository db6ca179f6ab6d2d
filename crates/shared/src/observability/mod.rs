//! 统一可观测性模块
//!
//! 提供 logging 与 metrics 的统一初始化和管理。
//! 所有入口通过单一入口点配置可观测性，确保一致的指标命名。

pub mod metrics;
pub mod middleware;
pub mod tracing;

use ::tracing::info;
use anyhow::Result;
use serde::Deserialize;

/// 可观测性配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// 服务名称，用于标识日志和指标的来源
    pub service_name: String,

    /// 日志级别（如 "info", "debug"），RUST_LOG 优先
    pub log_level: String,

    /// 是否启用 JSON 格式日志
    pub json_logs: bool,

    /// 是否启动 Prometheus 指标导出
    pub metrics_enabled: bool,

    /// Prometheus 指标导出端口
    pub metrics_port: u16,
}

fn default_metrics_port() -> u16 {
    9090
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown-service".to_string(),
            log_level: default_log_level(),
            json_logs: false,
            metrics_enabled: false,
            metrics_port: default_metrics_port(),
        }
    }
}

impl ObservabilityConfig {
    /// 从环境变量加载配置
    pub fn from_env(service_name: &str) -> Self {
        Self {
            service_name: service_name.to_string(),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| default_log_level()),
            json_logs: std::env::var("JSON_LOGS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            metrics_enabled: std::env::var("METRICS_PORT").is_ok(),
            metrics_port: std::env::var("METRICS_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_metrics_port),
        }
    }
}

/// 可观测性资源守卫
///
/// 持有指标导出服务的生命周期。
pub struct ObservabilityGuard {
    _metrics_handle: Option<metrics::MetricsHandle>,
}

impl ObservabilityGuard {
    /// 创建一个空的 Guard（用于测试或禁用可观测性时）
    pub fn empty() -> Self {
        Self {
            _metrics_handle: None,
        }
    }
}

impl Drop for ObservabilityGuard {
    fn drop(&mut self) {
        if self._metrics_handle.is_some() {
            info!("Shutting down observability...");
        }
    }
}

/// 统一初始化可观测性
///
/// 先初始化日志，再按配置启动 Prometheus 指标导出。
///
/// # Example
///
/// ```ignore
/// use storefront_shared::observability::{init, ObservabilityConfig};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = ObservabilityConfig::from_env("checkout-service");
///     let _guard = init(&config).await?;
///
///     // 应用逻辑...
///
///     Ok(())
/// }
/// ```
pub async fn init(config: &ObservabilityConfig) -> Result<ObservabilityGuard> {
    tracing::init(config)?;

    info!(
        service = %config.service_name,
        metrics_enabled = config.metrics_enabled,
        metrics_port = config.metrics_port,
        "Observability initialized"
    );

    let metrics_handle = if config.metrics_enabled {
        Some(metrics::init(config).await?)
    } else {
        None
    };

    Ok(ObservabilityGuard {
        _metrics_handle: metrics_handle,
    })
}
