//! 参考后端
//!
//! 内存版的优惠券与订单后端，提供模板查询、持有券查询和订单提交接口。
//! 订单提交时用同一个引擎重新校验优惠券，折扣以服务端计算为准。

mod coupon_routes;
mod order_routes;

use std::sync::Arc;

use axum::{Json, Router, middleware, routing::get};
use chrono::{DateTime, Utc};
use coupon_engine::{
    AppliedCoupon, ApplyError, CouponEngine, CouponTemplate, HeldCoupon, OrderContext,
    TemplateCatalog,
};
use storefront_shared::config::CheckoutConfig;
use storefront_shared::observability::{metrics, middleware as obs_middleware};
use storefront_shared::{Result, StorefrontError};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::checkout::engine_from_config;
use crate::models::OrderReceipt;
use crate::store::MemoryStore;

pub use coupon_routes::coupon_routes;
pub use order_routes::order_routes;

/// 后端共享状态
pub struct BackendState {
    pub templates: MemoryStore<CouponTemplate>,
    pub coupons: MemoryStore<HeldCoupon>,
    pub orders: MemoryStore<OrderReceipt>,
    engine: CouponEngine,
    shipping_fee: f64,
}

impl Default for BackendState {
    fn default() -> Self {
        Self::from_config(&CheckoutConfig::default())
    }
}

impl BackendState {
    pub fn new(engine: CouponEngine, shipping_fee: f64) -> Self {
        Self {
            templates: MemoryStore::new(),
            coupons: MemoryStore::new(),
            orders: MemoryStore::new(),
            engine,
            shipping_fee,
        }
    }

    pub fn from_config(config: &CheckoutConfig) -> Self {
        Self::new(engine_from_config(config), config.shipping_fee)
    }

    pub fn engine(&self) -> &CouponEngine {
        &self.engine
    }

    pub fn shipping_fee(&self) -> f64 {
        self.shipping_fee
    }

    /// 当前模板快照
    pub fn template_catalog(&self) -> TemplateCatalog {
        self.templates.list().into_iter().collect()
    }

    /// 用户持有的券，按过期时间升序、ID 升序排列
    pub fn held_coupons(&self, user_id: &str) -> Vec<HeldCoupon> {
        let mut coupons = self.coupons.list_by(|c| c.user_id == user_id);
        coupons.sort_by(|a, b| {
            a.expire_time
                .cmp(&b.expire_time)
                .then_with(|| a.id.cmp(&b.id))
        });
        coupons
    }

    /// 核销优惠券
    ///
    /// 先按引擎规则重新判定资格并计算折扣，再在分片锁内扣减一次可用次数。
    /// 并发提交时扣减到 0 之后的请求返回 `CouponExhausted`。
    pub fn redeem_coupon(
        &self,
        user_id: &str,
        coupon_id: &str,
        order: &OrderContext<'_>,
        now: DateTime<Utc>,
    ) -> Result<AppliedCoupon> {
        let coupon = self
            .coupons
            .get(coupon_id)
            .filter(|c| c.user_id == user_id)
            .ok_or_else(|| StorefrontError::NotFound {
                entity: "Coupon".to_string(),
                id: coupon_id.to_string(),
            })?;

        let catalog = self.template_catalog();
        let applied = self
            .engine
            .apply(order, coupon_id, std::slice::from_ref(&coupon), &catalog, now)
            .map_err(|err| match err {
                ApplyError::CouponNotFound(id) => StorefrontError::NotFound {
                    entity: "Coupon".to_string(),
                    id,
                },
                ApplyError::Ineligible { coupon_id, reason } => {
                    metrics::record_coupon_rejection(reason.code());
                    warn!(%coupon_id, %reason, "提交订单时优惠券校验未通过");
                    StorefrontError::CouponNotApplicable {
                        coupon_id,
                        reason: reason.to_string(),
                    }
                }
            })?;

        let decremented = self.coupons.update(coupon_id, |c| {
            if c.remaining_usage <= 0 {
                return false;
            }
            c.remaining_usage -= 1;
            true
        });

        match decremented {
            Some(true) => {
                info!(%coupon_id, user_id, "优惠券已核销");
                Ok(applied)
            }
            Some(false) => Err(StorefrontError::CouponExhausted {
                coupon_id: coupon_id.to_string(),
            }),
            None => Err(StorefrontError::NotFound {
                entity: "Coupon".to_string(),
                id: coupon_id.to_string(),
            }),
        }
    }
}

/// 组装完整的后端应用
pub fn router(state: Arc<BackendState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .merge(coupon_routes().with_state(state.clone()))
        .merge(order_routes().with_state(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(obs_middleware::http_tracing))
        .layer(middleware::from_fn(obs_middleware::request_id))
}

/// 存活探针
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "checkout-service"
    }))
}

/// 就绪探针，内存后端启动即就绪
async fn readiness_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ready",
        "services": ["coupon", "order"]
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::Duration;
    use coupon_engine::{DiscountType, OrderLineItem, OrderType};
    use tower::ServiceExt;

    fn seeded_state() -> BackendState {
        let state = BackendState::default();
        state.templates.insert(
            "tpl-fixed",
            CouponTemplate {
                id: "tpl-fixed".to_string(),
                name: "立减50".to_string(),
                discount_type: DiscountType::Fixed,
                discount_value: 50.0,
                min_purchase_amount: None,
            },
        );
        state.coupons.insert(
            "c-1",
            HeldCoupon {
                id: "c-1".to_string(),
                user_id: "user-1".to_string(),
                template_id: "tpl-fixed".to_string(),
                remaining_usage: 1,
                expire_time: Utc::now() + Duration::days(3),
            },
        );
        state
    }

    #[test]
    fn test_redeem_decrements_once() {
        let state = seeded_state();
        let items = vec![OrderLineItem::new("sku-1", 200.0, 1)];
        let order = OrderContext::from_items(OrderType::Direct, &items, 60.0);

        let applied = state
            .redeem_coupon("user-1", "c-1", &order, Utc::now())
            .unwrap();
        assert_eq!(applied.discount.amount, 50.0);
        assert_eq!(state.coupons.get("c-1").unwrap().remaining_usage, 0);

        // 第二次使用时引擎已判定次数用完
        let err = state
            .redeem_coupon("user-1", "c-1", &order, Utc::now())
            .unwrap_err();
        assert!(matches!(err, StorefrontError::CouponNotApplicable { .. }));
    }

    #[test]
    fn test_redeem_rejects_other_users_coupon() {
        let state = seeded_state();
        let items = vec![OrderLineItem::new("sku-1", 200.0, 1)];
        let order = OrderContext::from_items(OrderType::Direct, &items, 60.0);

        let err = state
            .redeem_coupon("user-2", "c-1", &order, Utc::now())
            .unwrap_err();
        assert!(matches!(err, StorefrontError::NotFound { .. }));
        assert_eq!(state.coupons.get("c-1").unwrap().remaining_usage, 1);
    }

    #[test]
    fn test_held_coupons_sorted_by_expiry() {
        let state = seeded_state();
        state.coupons.insert(
            "c-0",
            HeldCoupon {
                id: "c-0".to_string(),
                user_id: "user-1".to_string(),
                template_id: "tpl-fixed".to_string(),
                remaining_usage: 1,
                expire_time: Utc::now() + Duration::days(1),
            },
        );

        let ids: Vec<String> = state
            .held_coupons("user-1")
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec!["c-0", "c-1"]);
    }

    #[tokio::test]
    async fn test_health_and_ready() {
        let app = router(Arc::new(BackendState::default()));

        for uri in ["/health", "/ready"] {
            let response = app
                .clone()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
    }
}
