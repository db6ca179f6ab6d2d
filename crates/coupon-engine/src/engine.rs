//! 优惠券资格判定与折扣引擎
//!
//! 给定用户持有的优惠券、模板查找表和订单信息：
//! - 判定哪些优惠券当前可用于该订单
//! - 计算使用某张优惠券后的折扣金额及附带效果
//!
//! 引擎无内部状态，不做 I/O，当前时间由调用方显式传入。
//! 计算结果仅供展示，最终以后端校验为准。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;

use crate::bonus::select_buy_one_get_one_item;
use crate::discount::{OrderAmounts, compute_discount};
use crate::expiry::{ExpiryClock, ExpiryPolicy};
use crate::models::{
    CouponTemplate, DiscountResult, DiscountType, HeldCoupon, OrderLineItem, OrderType,
    TemplateCatalog,
};

/// 优惠券不可用的原因
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum IneligibleReason {
    #[error("拍卖订单不可使用优惠券")]
    AuctionOrder,

    #[error("优惠券可用次数已用完")]
    UsedUp,

    #[error("优惠券已过期")]
    Expired,

    #[error("优惠券模板不存在")]
    TemplateMissing,

    #[error("未达到最低消费: 需要 {required:.2}, 实际 {actual:.2}")]
    BelowMinimumPurchase { required: f64, actual: f64 },

    #[error("订单中没有可作为赠品的商品")]
    NoBonusItem,
}

impl IneligibleReason {
    /// 稳定的原因代码，用于指标标签和接口返回
    pub fn code(&self) -> &'static str {
        match self {
            Self::AuctionOrder => "auction_order",
            Self::UsedUp => "used_up",
            Self::Expired => "expired",
            Self::TemplateMissing => "template_missing",
            Self::BelowMinimumPurchase { .. } => "below_minimum_purchase",
            Self::NoBonusItem => "no_bonus_item",
        }
    }
}

/// 应用指定优惠券失败
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApplyError {
    #[error("优惠券不存在: {0}")]
    CouponNotFound(String),

    #[error("优惠券 {coupon_id} 不可用: {reason}")]
    Ineligible {
        coupon_id: String,
        reason: IneligibleReason,
    },
}

/// 引擎配置
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// 按日比较过期时间时使用的时区偏移（分钟）
    #[serde(default)]
    pub utc_offset_minutes: i32,
    #[serde(default)]
    pub expiry_policy: ExpiryPolicy,
}

/// 单次结算的订单信息
#[derive(Debug, Clone, Copy)]
pub struct OrderContext<'a> {
    pub order_type: OrderType,
    pub product_subtotal: f64,
    pub shipping_fee: f64,
    pub items: &'a [OrderLineItem],
}

impl<'a> OrderContext<'a> {
    pub fn new(
        order_type: OrderType,
        product_subtotal: f64,
        shipping_fee: f64,
        items: &'a [OrderLineItem],
    ) -> Self {
        Self {
            order_type,
            product_subtotal,
            shipping_fee,
            items,
        }
    }

    /// 由订单行计算商品小计
    pub fn from_items(order_type: OrderType, items: &'a [OrderLineItem], shipping_fee: f64) -> Self {
        let product_subtotal = items.iter().map(OrderLineItem::line_total).sum();
        Self::new(order_type, product_subtotal, shipping_fee, items)
    }

    pub fn amounts(&self) -> OrderAmounts {
        OrderAmounts {
            product_subtotal: self.product_subtotal,
            shipping_fee: self.shipping_fee,
        }
    }

    pub fn order_total(&self) -> f64 {
        self.amounts().order_total()
    }
}

/// 单张优惠券的判定结果
#[derive(Debug, Clone, PartialEq)]
pub struct CouponEvaluation<'c> {
    pub coupon: &'c HeldCoupon,
    pub outcome: Result<(), IneligibleReason>,
}

impl CouponEvaluation<'_> {
    pub fn is_eligible(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// 已确认可用的优惠券及其折扣
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedCoupon {
    pub coupon: HeldCoupon,
    pub template: CouponTemplate,
    pub discount: DiscountResult,
}

/// 优惠券引擎
#[derive(Debug, Clone, Copy, Default)]
pub struct CouponEngine {
    clock: ExpiryClock,
}

impl CouponEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            clock: ExpiryClock::from_offset_minutes(config.utc_offset_minutes, config.expiry_policy),
        }
    }

    pub fn with_clock(clock: ExpiryClock) -> Self {
        Self { clock }
    }

    /// 判定单张优惠券，可用时返回其模板
    pub fn check<'t>(
        &self,
        order: &OrderContext<'_>,
        coupon: &HeldCoupon,
        templates: &'t TemplateCatalog,
        now: DateTime<Utc>,
    ) -> Result<&'t CouponTemplate, IneligibleReason> {
        if order.order_type == OrderType::Auction {
            return Err(IneligibleReason::AuctionOrder);
        }

        if coupon.remaining_usage <= 0 {
            return Err(IneligibleReason::UsedUp);
        }

        if self.clock.is_expired(coupon.expire_time, now) {
            return Err(IneligibleReason::Expired);
        }

        let template = templates
            .get(&coupon.template_id)
            .ok_or(IneligibleReason::TemplateMissing)?;

        let order_total = order.order_total();
        if let Some(required) = template.min_purchase_amount {
            if order_total < required {
                return Err(IneligibleReason::BelowMinimumPurchase {
                    required,
                    actual: order_total,
                });
            }
        }

        if template.discount_type == DiscountType::BuyOneGetOne
            && select_buy_one_get_one_item(order.items).is_none()
        {
            return Err(IneligibleReason::NoBonusItem);
        }

        Ok(template)
    }

    /// 逐张判定，保持输入顺序
    ///
    /// 拍卖订单直接全部判为不可用，不再做后续检查。
    pub fn evaluate<'c>(
        &self,
        order: &OrderContext<'_>,
        held_coupons: &'c [HeldCoupon],
        templates: &TemplateCatalog,
        now: DateTime<Utc>,
    ) -> Vec<CouponEvaluation<'c>> {
        held_coupons
            .iter()
            .map(|coupon| {
                let outcome = self.check(order, coupon, templates, now).map(|_| ());
                if let Err(reason) = &outcome {
                    trace!(coupon_id = %coupon.id, %reason, "优惠券不可用");
                }
                CouponEvaluation { coupon, outcome }
            })
            .collect()
    }

    /// 可用优惠券列表，保持输入顺序
    pub fn eligible_coupons<'c>(
        &self,
        order: &OrderContext<'_>,
        held_coupons: &'c [HeldCoupon],
        templates: &TemplateCatalog,
        now: DateTime<Utc>,
    ) -> Vec<&'c HeldCoupon> {
        if order.order_type == OrderType::Auction {
            return Vec::new();
        }

        held_coupons
            .iter()
            .filter(|coupon| self.check(order, coupon, templates, now).is_ok())
            .collect()
    }

    /// 计算使用某模板的折扣
    pub fn compute_discount(
        &self,
        template: &CouponTemplate,
        order: &OrderContext<'_>,
    ) -> DiscountResult {
        compute_discount(template, order.amounts(), order.items)
    }

    /// 按 ID 选择优惠券，重新判定资格后计算折扣
    pub fn apply(
        &self,
        order: &OrderContext<'_>,
        coupon_id: &str,
        held_coupons: &[HeldCoupon],
        templates: &TemplateCatalog,
        now: DateTime<Utc>,
    ) -> Result<AppliedCoupon, ApplyError> {
        let coupon = held_coupons
            .iter()
            .find(|c| c.id == coupon_id)
            .ok_or_else(|| ApplyError::CouponNotFound(coupon_id.to_string()))?;

        let template = self
            .check(order, coupon, templates, now)
            .map_err(|reason| ApplyError::Ineligible {
                coupon_id: coupon_id.to_string(),
                reason,
            })?;

        Ok(AppliedCoupon {
            coupon: coupon.clone(),
            template: template.clone(),
            discount: self.compute_discount(template, order),
        })
    }
}
