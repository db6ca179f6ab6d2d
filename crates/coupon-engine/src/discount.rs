//! 折扣计算
//!
//! 纯函数：根据模板类型计算折扣金额及附带效果（免运费、赠品）。
//! 金额始终落在 `[0, 订单总额]` 区间内。

use crate::bonus::select_buy_one_get_one_item;
use crate::models::{CouponTemplate, DiscountResult, DiscountType, OrderLineItem};

/// 计算折扣所需的订单金额信息
#[derive(Debug, Clone, Copy)]
pub struct OrderAmounts {
    pub product_subtotal: f64,
    pub shipping_fee: f64,
}

impl OrderAmounts {
    /// 应付总额：商品小计 + 运费
    pub fn order_total(&self) -> f64 {
        self.product_subtotal + self.shipping_fee
    }
}

/// 四舍五入到整数货币单位（.5 向上）
pub fn round_half_up(value: f64) -> f64 {
    if value <= 0.0 {
        return 0.0;
    }
    (value + 0.5).floor()
}

/// 计算折扣
pub fn compute_discount(
    template: &CouponTemplate,
    amounts: OrderAmounts,
    items: &[OrderLineItem],
) -> DiscountResult {
    let order_total = amounts.order_total().max(0.0);

    let result = match template.discount_type {
        DiscountType::Percent => {
            let rate = template.discount_value.clamp(0.0, 1.0);
            DiscountResult {
                amount: round_half_up(order_total * rate),
                is_freeship: false,
                bonus_item: None,
            }
        }
        DiscountType::Fixed => DiscountResult {
            amount: template.discount_value.max(0.0).min(order_total),
            is_freeship: false,
            bonus_item: None,
        },
        DiscountType::Freeship => DiscountResult {
            amount: amounts.shipping_fee.max(0.0),
            is_freeship: true,
            bonus_item: None,
        },
        DiscountType::BuyOneGetOne => {
            let bonus = select_buy_one_get_one_item(items);
            DiscountResult {
                amount: bonus.map_or(0.0, |item| item.price),
                is_freeship: false,
                bonus_item: bonus.cloned(),
            }
        }
        DiscountType::Unknown => DiscountResult::none(),
    };

    DiscountResult {
        amount: result.amount.clamp(0.0, order_total),
        ..result
    }
}
