//! 重试策略与执行器
//!
//! 为幂等的外部调用（查询优惠券、模板）提供指数退避重试。
//! 只有 `StorefrontError::is_retryable` 为真的错误才会重试，
//! 业务错误直接向上传播。提交订单等非幂等操作不应经过这里。

use std::future::Future;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::StorefrontError;

/// 重试策略配置
///
/// 第 N 次重试前等待 `initial_delay * multiplier^N`，不超过 `max_delay`。
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// 最大重试次数（不含首次执行）
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(2),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// 客户端默认退避参数，仅覆盖重试次数
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// 计算第 N 次重试的等待时间（attempt 从 0 开始）
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base_ms = self.initial_delay.as_millis() as f64;
        let delay_ms = base_ms * self.multiplier.powi(attempt as i32);
        let capped_ms = delay_ms.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped_ms as u64)
    }

    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }
}

/// 带重试的异步执行器
pub async fn retry_with_policy<F, Fut, T>(
    policy: &RetryPolicy,
    operation_name: &str,
    mut operation: F,
) -> Result<T, StorefrontError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StorefrontError>>,
{
    let mut attempt: u32 = 0;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    info!(operation = operation_name, attempt, "操作在重试后成功");
                }
                return Ok(value);
            }
            Err(err) if !err.is_retryable() => return Err(err),
            Err(err) => {
                if !policy.should_retry(attempt) {
                    warn!(
                        operation = operation_name,
                        attempt,
                        max_retries = policy.max_retries,
                        error = %err,
                        "已达最大重试次数，放弃重试"
                    );
                    return Err(err);
                }

                let delay = policy.delay_for_attempt(attempt);
                warn!(
                    operation = operation_name,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "操作失败，将在退避后重试"
                );

                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
