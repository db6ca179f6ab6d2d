//! 基于 reqwest 的后端客户端

use std::time::Duration;

use async_trait::async_trait;
use coupon_engine::{CouponTemplate, HeldCoupon};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use storefront_shared::config::BackendClientConfig;
use storefront_shared::retry::{RetryPolicy, retry_with_policy};
use storefront_shared::{Result, StorefrontError};
use tracing::debug;

use super::CouponBackend;
use crate::models::{HeldCouponListResponse, OrderReceipt, SubmitOrderRequest, TemplateListResponse};

const SERVICE_NAME: &str = "coupon-backend";

/// 后端返回的错误体
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

/// HTTP 后端客户端
///
/// 查询接口按 `RetryPolicy` 重试，提交订单只发送一次。
#[derive(Debug, Clone)]
pub struct HttpCouponBackend {
    client: reqwest::Client,
    base_url: Url,
    retry: RetryPolicy,
}

impl HttpCouponBackend {
    pub fn new(config: &BackendClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| StorefrontError::Internal(format!("创建 HTTP 客户端失败: {}", e)))?;

        let base_url = Url::parse(&config.base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| StorefrontError::InvalidArgument {
                field: "backend.base_url".to_string(),
                message: format!("无效的后端地址: {}", config.base_url),
            })?;

        Ok(Self {
            client,
            base_url,
            retry: RetryPolicy::with_max_retries(config.max_retries),
        })
    }

    /// 逐段拼接路径，每段单独转义
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &Url, resource: &str) -> Result<T> {
        debug!(url = %url, "GET");
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(transport_error)?;
        decode(response, resource).await
    }
}

#[async_trait]
impl CouponBackend for HttpCouponBackend {
    async fn fetch_templates(&self) -> Result<Vec<CouponTemplate>> {
        let url = self.url(&["coupon-templates"]);
        let list: TemplateListResponse = retry_with_policy(&self.retry, "fetch_templates", || {
            self.get_json(&url, "coupon-templates")
        })
        .await?;
        Ok(list.templates)
    }

    async fn fetch_held_coupons(&self, user_id: &str) -> Result<Vec<HeldCoupon>> {
        let url = self.url(&["users", user_id, "coupons"]);
        let list: HeldCouponListResponse =
            retry_with_policy(&self.retry, "fetch_held_coupons", || {
                self.get_json(&url, user_id)
            })
            .await?;
        Ok(list.coupons)
    }

    async fn submit_order(&self, request: &SubmitOrderRequest) -> Result<OrderReceipt> {
        let response = self
            .client
            .post(self.url(&["orders"]))
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        let resource = request.coupon_id.as_deref().unwrap_or("order");
        decode(response, resource).await
    }
}

fn transport_error(err: reqwest::Error) -> StorefrontError {
    if err.is_timeout() {
        StorefrontError::ExternalServiceTimeout {
            service: SERVICE_NAME.to_string(),
        }
    } else {
        StorefrontError::ExternalService {
            service: SERVICE_NAME.to_string(),
            message: err.to_string(),
        }
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response, resource: &str) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|e| StorefrontError::Internal(format!("后端响应解析失败: {}", e)));
    }

    let body = response.json::<ApiErrorBody>().await.ok();
    Err(error_from_response(status, body, resource))
}

/// 把后端的错误响应还原为本地错误
fn error_from_response(
    status: StatusCode,
    body: Option<ApiErrorBody>,
    resource: &str,
) -> StorefrontError {
    let (code, message) = body
        .map(|b| (b.code, b.message))
        .unwrap_or_else(|| (String::new(), status.to_string()));

    match (status, code.as_str()) {
        (StatusCode::NOT_FOUND, _) => StorefrontError::NotFound {
            entity: "Remote".to_string(),
            id: resource.to_string(),
        },
        (_, "COUPON_EXHAUSTED") => StorefrontError::CouponExhausted {
            coupon_id: resource.to_string(),
        },
        (StatusCode::UNPROCESSABLE_ENTITY, _) => StorefrontError::CouponNotApplicable {
            coupon_id: resource.to_string(),
            reason: message,
        },
        (s, _) if s.is_client_error() => StorefrontError::Validation(message),
        (s, _) => StorefrontError::ExternalService {
            service: SERVICE_NAME.to_string(),
            message: format!("{}: {}", s, message),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(code: &str, message: &str) -> Option<ApiErrorBody> {
        Some(ApiErrorBody {
            code: code.to_string(),
            message: message.to_string(),
        })
    }

    #[test]
    fn test_business_errors_mapped() {
        let err = error_from_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            body("COUPON_NOT_APPLICABLE", "优惠券已过期"),
            "c-1",
        );
        assert!(matches!(
            err,
            StorefrontError::CouponNotApplicable { ref coupon_id, ref reason }
                if coupon_id == "c-1" && reason == "优惠券已过期"
        ));
        assert!(!err.is_retryable());

        let err = error_from_response(
            StatusCode::CONFLICT,
            body("COUPON_EXHAUSTED", "used"),
            "c-2",
        );
        assert!(matches!(err, StorefrontError::CouponExhausted { .. }));

        let err = error_from_response(StatusCode::BAD_REQUEST, body("VALIDATION_ERROR", "x"), "o");
        assert!(matches!(err, StorefrontError::Validation(_)));
    }

    #[test]
    fn test_server_errors_are_retryable() {
        let err = error_from_response(StatusCode::SERVICE_UNAVAILABLE, None, "coupon-templates");
        assert!(err.is_retryable());
    }

    fn backend(base_url: &str) -> HttpCouponBackend {
        let config = BackendClientConfig {
            base_url: base_url.to_string(),
            ..Default::default()
        };
        HttpCouponBackend::new(&config).unwrap()
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let b = backend("http://localhost:8090/");
        assert_eq!(b.url(&["orders"]).as_str(), "http://localhost:8090/orders");

        let b = backend("http://localhost:8090/api/");
        assert_eq!(
            b.url(&["orders"]).as_str(),
            "http://localhost:8090/api/orders"
        );
    }

    #[test]
    fn test_user_id_escaped_as_single_segment() {
        let backend = backend("http://localhost:8090");
        let url = backend.url(&["users", "a/b?c#d", "coupons"]);

        assert_eq!(
            url.as_str(),
            "http://localhost:8090/users/a%2Fb%3Fc%23d/coupons"
        );
        assert!(url.query().is_none());
        assert!(url.fragment().is_none());
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let config = BackendClientConfig {
            base_url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            HttpCouponBackend::new(&config),
            Err(StorefrontError::InvalidArgument { .. })
        ));
    }
}
