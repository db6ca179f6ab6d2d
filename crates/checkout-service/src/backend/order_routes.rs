//! 订单提交与查询接口

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::Utc;
use coupon_engine::{DiscountResult, OrderContext};
use storefront_shared::observability::metrics;
use storefront_shared::{Result, StorefrontError};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use super::BackendState;
use crate::checkout::payable_amount;
use crate::models::{OrderReceipt, OrderStatus, SubmitOrderRequest};

/// 客户端折扣与服务端折扣的对账容差
const DISCOUNT_TOLERANCE: f64 = 0.005;

pub fn order_routes() -> Router<Arc<BackendState>> {
    Router::new()
        .route("/orders", post(submit_order))
        .route("/orders/{order_id}", get(get_order))
}

/// 提交订单
#[tracing::instrument(skip(state, req))]
async fn submit_order(
    State(state): State<Arc<BackendState>>,
    Json(req): Json<SubmitOrderRequest>,
) -> Result<(StatusCode, Json<OrderReceipt>)> {
    match accept_order(&state, req) {
        Ok(receipt) => {
            metrics::record_order_submission("accepted", receipt.discount.amount);
            Ok((StatusCode::CREATED, Json(receipt)))
        }
        Err(err) => {
            metrics::record_order_submission("rejected", 0.0);
            Err(err)
        }
    }
}

fn accept_order(state: &BackendState, req: SubmitOrderRequest) -> Result<OrderReceipt> {
    req.validate()?;

    let items = req.line_items();
    let order = OrderContext::from_items(req.order_type, &items, state.shipping_fee());
    let now = Utc::now();

    let discount = match req.coupon_id.as_deref() {
        Some(coupon_id) => {
            let applied = state.redeem_coupon(&req.user_id, coupon_id, &order, now)?;
            if let Some(client_discount) = req.client_discount {
                if (client_discount - applied.discount.amount).abs() > DISCOUNT_TOLERANCE {
                    warn!(
                        coupon_id,
                        client_discount,
                        server_discount = applied.discount.amount,
                        "客户端试算折扣与服务端不一致，以服务端为准"
                    );
                }
            }
            applied.discount
        }
        None => DiscountResult::none(),
    };

    let product_subtotal = order.product_subtotal;
    let shipping_fee = order.shipping_fee;
    let order_total = order.order_total();
    let receipt = OrderReceipt {
        order_id: format!("ORD-{}", Uuid::now_v7().simple()),
        user_id: req.user_id,
        order_type: req.order_type,
        status: OrderStatus::Accepted,
        items,
        product_subtotal,
        shipping_fee,
        order_total,
        coupon_id: req.coupon_id,
        payable: payable_amount(order_total, &discount),
        discount,
        created_at: now,
    };

    state.orders.insert(&receipt.order_id, receipt.clone());
    info!(
        order_id = %receipt.order_id,
        order_total = receipt.order_total,
        payable = receipt.payable,
        "订单已受理"
    );

    Ok(receipt)
}

/// 查询订单
#[tracing::instrument(skip(state))]
async fn get_order(
    State(state): State<Arc<BackendState>>,
    Path(order_id): Path<String>,
) -> Result<Json<OrderReceipt>> {
    state
        .orders
        .get(&order_id)
        .map(Json)
        .ok_or(StorefrontError::NotFound {
            entity: "Order".to_string(),
            id: order_id,
        })
}

// ============================================================================
// 单元测试
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use chrono::Duration;
    use coupon_engine::{CouponTemplate, DiscountType, HeldCoupon};
    use tower::ServiceExt;

    fn seeded_state() -> Arc<BackendState> {
        let state = BackendState::default();
        state.templates.insert_many(
            vec![
                CouponTemplate {
                    id: "tpl-fixed".to_string(),
                    name: "立减500".to_string(),
                    discount_type: DiscountType::Fixed,
                    discount_value: 500.0,
                    min_purchase_amount: None,
                },
                CouponTemplate {
                    id: "tpl-min".to_string(),
                    name: "满1000减100".to_string(),
                    discount_type: DiscountType::Fixed,
                    discount_value: 100.0,
                    min_purchase_amount: Some(1000.0),
                },
            ],
            |t| t.id.clone(),
        );
        for (id, template_id) in [("c-fixed", "tpl-fixed"), ("c-min", "tpl-min")] {
            state.coupons.insert(
                id,
                HeldCoupon {
                    id: id.to_string(),
                    user_id: "user-1".to_string(),
                    template_id: template_id.to_string(),
                    remaining_usage: 1,
                    expire_time: Utc::now() + Duration::days(10),
                },
            );
        }
        Arc::new(state)
    }

    fn order_body(order_type: &str, coupon_id: Option<&str>, client_discount: f64) -> Body {
        let body = serde_json::json!({
            "user_id": "user-1",
            "order_type": order_type,
            "items": [{ "id": "sku-1", "price": 240.0, "quantity": 1 }],
            "coupon_id": coupon_id,
            "client_discount": client_discount
        });
        Body::from(body.to_string())
    }

    fn post_order(body: Body) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/orders")
            .header("content-type", "application/json")
            .body(body)
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_submit_with_coupon_uses_server_discount() {
        let state = seeded_state();
        let app = order_routes().with_state(state.clone());

        // 客户端报 999，服务端按 min(500, 300) 计算
        let response = app
            .oneshot(post_order(order_body("DIRECT", Some("c-fixed"), 999.0)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let receipt: OrderReceipt = serde_json::from_value(body_json(response).await).unwrap();
        assert_eq!(receipt.order_total, 300.0);
        assert_eq!(receipt.discount.amount, 300.0);
        assert_eq!(receipt.payable, 0.0);
        assert_eq!(state.coupons.get("c-fixed").unwrap().remaining_usage, 0);
        assert!(state.orders.contains(&receipt.order_id));
    }

    #[tokio::test]
    async fn test_second_use_of_single_use_coupon_rejected() {
        let state = seeded_state();

        let first = order_routes()
            .with_state(state.clone())
            .oneshot(post_order(order_body("DIRECT", Some("c-fixed"), 300.0)))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::CREATED);

        let second = order_routes()
            .with_state(state.clone())
            .oneshot(post_order(order_body("DIRECT", Some("c-fixed"), 300.0)))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(state.coupons.get("c-fixed").unwrap().remaining_usage, 0);
        assert_eq!(state.orders.count(), 1);
    }

    #[tokio::test]
    async fn test_below_minimum_rejected_without_decrement() {
        let state = seeded_state();
        let response = order_routes()
            .with_state(state.clone())
            .oneshot(post_order(order_body("DIRECT", Some("c-min"), 100.0)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body_json(response).await["code"], "COUPON_NOT_APPLICABLE");
        assert_eq!(state.coupons.get("c-min").unwrap().remaining_usage, 1);
    }

    #[tokio::test]
    async fn test_auction_order_with_coupon_rejected() {
        let state = seeded_state();
        let response = order_routes()
            .with_state(state.clone())
            .oneshot(post_order(order_body("AUCTION", Some("c-fixed"), 0.0)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(state.coupons.get("c-fixed").unwrap().remaining_usage, 1);
    }

    #[tokio::test]
    async fn test_auction_order_without_coupon_accepted() {
        let response = order_routes()
            .with_state(seeded_state())
            .oneshot(post_order(order_body("AUCTION", None, 0.0)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let receipt: OrderReceipt = serde_json::from_value(body_json(response).await).unwrap();
        assert_eq!(receipt.payable, 300.0);
        assert!(receipt.coupon_id.is_none());
    }

    #[tokio::test]
    async fn test_quoted_coupon_at_minimum_boundary_is_redeemable() {
        use crate::checkout::{QuoteInput, build_quote};
        use crate::models::OrderItemRequest;

        // 两个卖家交错出现，按卖家分组累加与按行累加的浮点结果不同
        let items = vec![
            coupon_engine::OrderLineItem::new("sku-a1", 0.1, 1).with_seller("seller-a"),
            coupon_engine::OrderLineItem::new("sku-b1", 0.1, 1).with_seller("seller-b"),
            coupon_engine::OrderLineItem::new("sku-a2", 19.99, 1).with_seller("seller-a"),
        ];
        let boundary: f64 = items
            .iter()
            .map(coupon_engine::OrderLineItem::line_total)
            .sum();

        let state = BackendState::new(coupon_engine::CouponEngine::default(), 0.0);
        state.templates.insert(
            "tpl-edge",
            CouponTemplate {
                id: "tpl-edge".to_string(),
                name: "满额立减".to_string(),
                discount_type: DiscountType::Fixed,
                discount_value: 1.0,
                min_purchase_amount: Some(boundary),
            },
        );
        let coupon = HeldCoupon {
            id: "c-edge".to_string(),
            user_id: "user-1".to_string(),
            template_id: "tpl-edge".to_string(),
            remaining_usage: 1,
            expire_time: Utc::now() + Duration::days(10),
        };
        state.coupons.insert("c-edge", coupon.clone());

        let catalog = state.template_catalog();
        let held = vec![coupon];
        let quote = build_quote(
            state.engine(),
            QuoteInput {
                user_id: "user-1",
                order_type: coupon_engine::OrderType::Direct,
                items: &items,
                shipping_fee: state.shipping_fee(),
                held_coupons: &held,
                templates: &catalog,
                selected_coupon_id: Some("c-edge"),
                now: Utc::now(),
            },
        );
        let applied = quote.applied.clone().unwrap();

        let receipt = accept_order(
            &state,
            SubmitOrderRequest {
                user_id: "user-1".to_string(),
                order_type: quote.order_type,
                items: items.iter().map(OrderItemRequest::from).collect(),
                coupon_id: Some(applied.coupon_id.clone()),
                client_discount: Some(applied.discount.amount),
            },
        )
        .unwrap();

        assert_eq!(receipt.product_subtotal.to_bits(), quote.product_subtotal.to_bits());
        assert_eq!(receipt.discount.amount, applied.discount.amount);
        assert_eq!(state.coupons.get("c-edge").unwrap().remaining_usage, 0);
    }

    #[tokio::test]
    async fn test_invalid_order_rejected() {
        let body = serde_json::json!({
            "user_id": "user-1",
            "order_type": "DIRECT",
            "items": []
        });
        let response = order_routes()
            .with_state(seeded_state())
            .oneshot(post_order(Body::from(body.to_string())))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_get_order() {
        let state = seeded_state();
        let created = order_routes()
            .with_state(state.clone())
            .oneshot(post_order(order_body("DIRECT", None, 0.0)))
            .await
            .unwrap();
        let receipt: OrderReceipt = serde_json::from_value(body_json(created).await).unwrap();

        let response = order_routes()
            .with_state(state.clone())
            .oneshot(
                Request::builder()
                    .uri(format!("/orders/{}", receipt.order_id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let missing = order_routes()
            .with_state(state)
            .oneshot(
                Request::builder()
                    .uri("/orders/ORD-missing")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }
}
