//! 日志初始化
//!
//! 基于 tracing-subscriber，支持 pretty 与 JSON 两种输出格式。
//! RUST_LOG 环境变量优先于配置中的日志级别。

use anyhow::Result;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use super::ObservabilityConfig;

/// 构建环境过滤器
pub fn env_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// 初始化全局日志订阅者
///
/// 重复初始化会返回错误，测试中可忽略。
pub fn init(config: &ObservabilityConfig) -> Result<()> {
    let fmt_layer = if config.json_logs {
        fmt::layer()
            .json()
            .with_span_events(FmtSpan::CLOSE)
            .with_target(true)
            .with_thread_ids(true)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter(&config.log_level))
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
