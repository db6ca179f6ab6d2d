//! 结算试算
//!
//! 纯计算：给定订单、持有券和模板，产出可用券列表、选中券的折扣和应付金额。
//! 在线结算与离线 `quote` 命令共用这一实现。

use chrono::{DateTime, Utc};
use coupon_engine::{
    CartSummary, CouponEngine, CouponTemplate, DiscountResult, DiscountType, HeldCoupon,
    IneligibleReason, OrderContext, OrderLineItem, OrderType, TemplateCatalog,
};
use serde::{Deserialize, Serialize};

use super::payable_amount;

/// 选中但未持有的优惠券
const NOT_HELD_CODE: &str = "not_held";

/// 可用优惠券及其预估折扣
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotedCoupon {
    pub coupon_id: String,
    pub template_id: String,
    pub template_name: String,
    pub discount_type: DiscountType,
    pub discount: DiscountResult,
}

impl QuotedCoupon {
    fn new(coupon: &HeldCoupon, template: &CouponTemplate, discount: DiscountResult) -> Self {
        Self {
            coupon_id: coupon.id.clone(),
            template_id: template.id.clone(),
            template_name: template.name.clone(),
            discount_type: template.discount_type,
            discount,
        }
    }
}

/// 不可用的优惠券及原因
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouponRejection {
    pub coupon_id: String,
    pub code: String,
    pub message: String,
}

impl CouponRejection {
    fn from_reason(coupon_id: &str, reason: &IneligibleReason) -> Self {
        Self {
            coupon_id: coupon_id.to_string(),
            code: reason.code().to_string(),
            message: reason.to_string(),
        }
    }

    fn not_held(coupon_id: &str) -> Self {
        Self {
            coupon_id: coupon_id.to_string(),
            code: NOT_HELD_CODE.to_string(),
            message: "未持有该优惠券".to_string(),
        }
    }
}

/// 结算试算结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutQuote {
    pub user_id: String,
    pub order_type: OrderType,
    pub items: Vec<OrderLineItem>,
    pub cart: CartSummary,
    pub product_subtotal: f64,
    pub shipping_fee: f64,
    pub order_total: f64,
    /// 可用券，保持持有券的原始顺序
    pub eligible: Vec<QuotedCoupon>,
    pub ineligible: Vec<CouponRejection>,
    pub applied: Option<QuotedCoupon>,
    /// 选中的券不可用时附带原因，不视为错误
    pub rejected_selection: Option<CouponRejection>,
    pub payable: f64,
    pub quoted_at: DateTime<Utc>,
}

impl CheckoutQuote {
    /// 选中券的折扣金额，未选或不可用时为 0
    pub fn discount_amount(&self) -> f64 {
        self.applied
            .as_ref()
            .map(|c| c.discount.amount)
            .unwrap_or(0.0)
    }
}

/// 试算输入
#[derive(Debug, Clone, Copy)]
pub struct QuoteInput<'a> {
    pub user_id: &'a str,
    pub order_type: OrderType,
    pub items: &'a [OrderLineItem],
    pub shipping_fee: f64,
    pub held_coupons: &'a [HeldCoupon],
    pub templates: &'a TemplateCatalog,
    pub selected_coupon_id: Option<&'a str>,
    pub now: DateTime<Utc>,
}

pub fn build_quote(engine: &CouponEngine, input: QuoteInput<'_>) -> CheckoutQuote {
    let cart = CartSummary::from_items(input.items);
    let order = OrderContext::from_items(input.order_type, input.items, input.shipping_fee);

    let mut eligible = Vec::new();
    let mut ineligible = Vec::new();
    for coupon in input.held_coupons {
        match engine.check(&order, coupon, input.templates, input.now) {
            Ok(template) => {
                let discount = engine.compute_discount(template, &order);
                eligible.push(QuotedCoupon::new(coupon, template, discount));
            }
            Err(reason) => ineligible.push(CouponRejection::from_reason(&coupon.id, &reason)),
        }
    }

    let (applied, rejected_selection) = match input.selected_coupon_id {
        None => (None, None),
        Some(selected) => match eligible.iter().find(|c| c.coupon_id == selected) {
            Some(quoted) => (Some(quoted.clone()), None),
            None => {
                let rejection = ineligible
                    .iter()
                    .find(|r| r.coupon_id == selected)
                    .cloned()
                    .unwrap_or_else(|| CouponRejection::not_held(selected));
                (None, Some(rejection))
            }
        },
    };

    let order_total = order.order_total();
    let discount = applied
        .as_ref()
        .map(|c| c.discount.clone())
        .unwrap_or_else(DiscountResult::none);

    CheckoutQuote {
        user_id: input.user_id.to_string(),
        order_type: input.order_type,
        items: input.items.to_vec(),
        cart,
        product_subtotal: order.product_subtotal,
        shipping_fee: order.shipping_fee,
        order_total,
        eligible,
        ineligible,
        applied,
        rejected_selection,
        payable: payable_amount(order_total, &discount),
        quoted_at: input.now,
    }
}
