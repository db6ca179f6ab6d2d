//! 统一错误处理模块
//!
//! 定义结算相关服务共享的错误类型，使用 thiserror 提供良好的错误信息，
//! 并统一映射为 HTTP 响应。

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// 系统错误类型
#[derive(Debug, Error)]
pub enum StorefrontError {
    // ==================== 资源错误 ====================
    #[error("记录未找到: {entity} id={id}")]
    NotFound { entity: String, id: String },

    #[error("记录已存在: {entity} {field}={value}")]
    AlreadyExists {
        entity: String,
        field: String,
        value: String,
    },

    // ==================== 业务逻辑错误 ====================
    #[error("优惠券不可用: coupon_id={coupon_id}, {reason}")]
    CouponNotApplicable { coupon_id: String, reason: String },

    #[error("优惠券可用次数已用完: coupon_id={coupon_id}")]
    CouponExhausted { coupon_id: String },

    // ==================== 验证错误 ====================
    #[error("参数验证失败: {0}")]
    Validation(String),

    #[error("无效的参数: {field} - {message}")]
    InvalidArgument { field: String, message: String },

    // ==================== 外部服务错误 ====================
    #[error("外部服务错误: {service} - {message}")]
    ExternalService { service: String, message: String },

    #[error("外部服务超时: {service}")]
    ExternalServiceTimeout { service: String },

    // ==================== 通用错误 ====================
    #[error("配置错误: {0}")]
    Config(#[from] config::ConfigError),

    #[error("内部错误: {0}")]
    Internal(String),
}

/// 错误结果类型别名
pub type Result<T> = std::result::Result<T, StorefrontError>;

impl StorefrontError {
    /// 获取错误码
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::AlreadyExists { .. } => "ALREADY_EXISTS",
            Self::CouponNotApplicable { .. } => "COUPON_NOT_APPLICABLE",
            Self::CouponExhausted { .. } => "COUPON_EXHAUSTED",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidArgument { .. } => "INVALID_ARGUMENT",
            Self::ExternalService { .. } => "EXTERNAL_SERVICE_ERROR",
            Self::ExternalServiceTimeout { .. } => "EXTERNAL_SERVICE_TIMEOUT",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// 是否为可重试错误
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ExternalService { .. } | Self::ExternalServiceTimeout { .. }
        )
    }

    /// 返回对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::AlreadyExists { .. } | Self::CouponExhausted { .. } => StatusCode::CONFLICT,
            Self::CouponNotApplicable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Validation(_) | Self::InvalidArgument { .. } => StatusCode::BAD_REQUEST,
            Self::ExternalService { .. } => StatusCode::BAD_GATEWAY,
            Self::ExternalServiceTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            Self::Config(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for StorefrontError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // 系统级错误只返回通用提示，详细信息仅记录日志
        let message = match &self {
            Self::Config(e) => {
                tracing::error!(error = %e, "配置错误");
                "服务内部错误，请稍后重试".to_string()
            }
            Self::Internal(e) => {
                tracing::error!(error = %e, "内部错误");
                "服务内部错误，请稍后重试".to_string()
            }
            other => other.to_string(),
        };

        let body = json!({
            "success": false,
            "code": self.code(),
            "message": message,
            "data": serde_json::Value::Null
        });

        (status, axum::Json(body)).into_response()
    }
}

/// 从 validator 错误转换
impl From<validator::ValidationErrors> for StorefrontError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

/// 从 JSON 序列化错误转换
impl From<serde_json::Error> for StorefrontError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("JSON 处理错误: {}", err))
    }
}
