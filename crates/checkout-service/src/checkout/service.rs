//! 结算服务

use std::sync::Arc;

use chrono::{DateTime, Utc};
use coupon_engine::{CouponEngine, OrderLineItem, OrderType, TemplateCatalog};
use storefront_shared::config::CheckoutConfig;
use storefront_shared::observability::metrics;
use storefront_shared::{Result, StorefrontError};
use tracing::{info, instrument};

use super::quote::{CheckoutQuote, QuoteInput, build_quote};
use super::session::CheckoutSession;
use super::engine_from_config;
use crate::client::CouponBackend;
use crate::models::{OrderItemRequest, OrderReceipt, SubmitOrderRequest};

/// 结算服务
///
/// 试算结果只用于展示，提交后以后端的校验和折扣为准。
pub struct CheckoutService<B>
where
    B: CouponBackend,
{
    backend: Arc<B>,
    engine: CouponEngine,
    shipping_fee: f64,
}

impl<B> CheckoutService<B>
where
    B: CouponBackend,
{
    pub fn new(backend: Arc<B>, engine: CouponEngine, shipping_fee: f64) -> Self {
        Self {
            backend,
            engine,
            shipping_fee,
        }
    }

    pub fn from_config(backend: Arc<B>, config: &CheckoutConfig) -> Self {
        Self::new(backend, engine_from_config(config), config.shipping_fee)
    }

    /// 以当前时间试算
    pub async fn quote(
        &self,
        session: &CheckoutSession,
        order_type: OrderType,
        items: Vec<OrderLineItem>,
        selected_coupon_id: Option<&str>,
    ) -> Result<CheckoutQuote> {
        self.quote_at(session, order_type, items, selected_coupon_id, Utc::now())
            .await
    }

    /// 以指定时间试算
    #[instrument(skip(self, items), fields(user_id = %session.user_id))]
    pub async fn quote_at(
        &self,
        session: &CheckoutSession,
        order_type: OrderType,
        items: Vec<OrderLineItem>,
        selected_coupon_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<CheckoutQuote> {
        let (templates, held_coupons) = tokio::try_join!(
            self.backend.fetch_templates(),
            self.backend.fetch_held_coupons(&session.user_id),
        )?;
        let templates: TemplateCatalog = templates.into_iter().collect();

        let quote = build_quote(
            &self.engine,
            QuoteInput {
                user_id: &session.user_id,
                order_type,
                items: &items,
                shipping_fee: self.shipping_fee,
                held_coupons: &held_coupons,
                templates: &templates,
                selected_coupon_id,
                now,
            },
        );

        for rejection in &quote.ineligible {
            metrics::record_coupon_rejection(&rejection.code);
        }
        metrics::record_checkout_quote(
            order_type.as_str(),
            quote.eligible.len(),
            quote.applied.is_some(),
        );
        info!(
            held = held_coupons.len(),
            eligible = quote.eligible.len(),
            order_total = quote.order_total,
            payable = quote.payable,
            "结算试算完成"
        );

        Ok(quote)
    }

    /// 提交订单，附带选中的券和客户端试算的折扣
    #[instrument(skip(self, quote), fields(user_id = %session.user_id))]
    pub async fn submit(
        &self,
        session: &CheckoutSession,
        quote: &CheckoutQuote,
    ) -> Result<OrderReceipt> {
        if quote.user_id != session.user_id {
            return Err(StorefrontError::InvalidArgument {
                field: "user_id".to_string(),
                message: "试算结果不属于当前用户".to_string(),
            });
        }

        let request = SubmitOrderRequest {
            user_id: session.user_id.clone(),
            order_type: quote.order_type,
            items: quote.items.iter().map(OrderItemRequest::from).collect(),
            coupon_id: quote.applied.as_ref().map(|c| c.coupon_id.clone()),
            client_discount: quote.applied.as_ref().map(|c| c.discount.amount),
        };

        let receipt = self.backend.submit_order(&request).await?;
        info!(order_id = %receipt.order_id, payable = receipt.payable, "订单已提交");
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockCouponBackend;
    use crate::models::OrderStatus;
    use chrono::{Duration, TimeZone};
    use coupon_engine::{CouponTemplate, DiscountResult, DiscountType, HeldCoupon};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn fixed_template() -> CouponTemplate {
        CouponTemplate {
            id: "tpl-fixed".to_string(),
            name: "立减500".to_string(),
            discount_type: DiscountType::Fixed,
            discount_value: 500.0,
            min_purchase_amount: None,
        }
    }

    fn held(id: &str, remaining_usage: i32) -> HeldCoupon {
        HeldCoupon {
            id: id.to_string(),
            user_id: "user-1".to_string(),
            template_id: "tpl-fixed".to_string(),
            remaining_usage,
            expire_time: now() + Duration::days(1),
        }
    }

    fn backend_with_coupons(coupons: Vec<HeldCoupon>) -> MockCouponBackend {
        let mut backend = MockCouponBackend::new();
        backend
            .expect_fetch_templates()
            .times(1)
            .returning(|| Ok(vec![fixed_template()]));
        backend
            .expect_fetch_held_coupons()
            .withf(|user_id| user_id == "user-1")
            .times(1)
            .returning(move |_| Ok(coupons.clone()));
        backend
    }

    #[tokio::test]
    async fn test_quote_applies_selected_coupon() {
        let backend = backend_with_coupons(vec![held("c-used", 0), held("c-ok", 1)]);
        let service = CheckoutService::new(Arc::new(backend), CouponEngine::default(), 60.0);
        let session = CheckoutSession::new("user-1");

        let quote = service
            .quote_at(
                &session,
                OrderType::Direct,
                vec![OrderLineItem::new("sku-1", 240.0, 1)],
                Some("c-ok"),
                now(),
            )
            .await
            .unwrap();

        assert_eq!(quote.eligible.len(), 1);
        assert_eq!(quote.ineligible[0].code, "used_up");
        // 固定金额不超过订单总额
        assert_eq!(quote.discount_amount(), 300.0);
        assert_eq!(quote.payable, 0.0);
    }

    #[tokio::test]
    async fn test_quote_propagates_backend_error() {
        let mut backend = MockCouponBackend::new();
        backend.expect_fetch_templates().returning(|| {
            Err(StorefrontError::ExternalServiceTimeout {
                service: "coupon-backend".to_string(),
            })
        });
        backend
            .expect_fetch_held_coupons()
            .returning(|_| Ok(Vec::new()));

        let service = CheckoutService::new(Arc::new(backend), CouponEngine::default(), 60.0);
        let result = service
            .quote(
                &CheckoutSession::new("user-1"),
                OrderType::Direct,
                vec![OrderLineItem::new("sku-1", 10.0, 1)],
                None,
            )
            .await;

        assert!(matches!(
            result,
            Err(StorefrontError::ExternalServiceTimeout { .. })
        ));
    }

    #[tokio::test]
    async fn test_submit_sends_selected_coupon_and_client_discount() {
        let mut backend = backend_with_coupons(vec![held("c-ok", 1)]);
        backend
            .expect_submit_order()
            .withf(|req| {
                req.user_id == "user-1"
                    && req.coupon_id.as_deref() == Some("c-ok")
                    && req.client_discount == Some(300.0)
                    && req.items.len() == 1
            })
            .times(1)
            .returning(|req| {
                Ok(OrderReceipt {
                    order_id: "ORD-1".to_string(),
                    user_id: req.user_id.clone(),
                    order_type: req.order_type,
                    status: OrderStatus::Accepted,
                    items: req.line_items(),
                    product_subtotal: 240.0,
                    shipping_fee: 60.0,
                    order_total: 300.0,
                    coupon_id: req.coupon_id.clone(),
                    discount: DiscountResult {
                        amount: 300.0,
                        is_freeship: false,
                        bonus_item: None,
                    },
                    payable: 0.0,
                    created_at: now(),
                })
            });

        let service = CheckoutService::new(Arc::new(backend), CouponEngine::default(), 60.0);
        let session = CheckoutSession::new("user-1");
        let quote = service
            .quote_at(
                &session,
                OrderType::Direct,
                vec![OrderLineItem::new("sku-1", 240.0, 1)],
                Some("c-ok"),
                now(),
            )
            .await
            .unwrap();

        let receipt = tokio_test::assert_ok!(service.submit(&session, &quote).await);
        assert_eq!(receipt.order_id, "ORD-1");
        assert_eq!(receipt.payable, 0.0);
    }

    #[tokio::test]
    async fn test_submit_rejects_foreign_quote() {
        let backend = backend_with_coupons(vec![]);
        let service = CheckoutService::new(Arc::new(backend), CouponEngine::default(), 60.0);

        let quote = service
            .quote_at(
                &CheckoutSession::new("user-1"),
                OrderType::Direct,
                vec![OrderLineItem::new("sku-1", 10.0, 1)],
                None,
                now(),
            )
            .await
            .unwrap();

        let err = service
            .submit(&CheckoutSession::new("user-2"), &quote)
            .await
            .unwrap_err();
        assert!(matches!(err, StorefrontError::InvalidArgument { .. }));
    }
}
