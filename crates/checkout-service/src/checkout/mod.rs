//! 结算编排
//!
//! 拉取模板与持有券，调用引擎生成结算试算，并把选中的优惠券随订单提交。

mod quote;
mod service;
mod session;

use coupon_engine::{CouponEngine, DiscountResult, EngineConfig, ExpiryPolicy};
use storefront_shared::config::CheckoutConfig;

pub use quote::{CheckoutQuote, CouponRejection, QuoteInput, QuotedCoupon, build_quote};
pub use service::CheckoutService;
pub use session::CheckoutSession;

/// 按结算配置构造引擎，客户端与后端共用以保证判定一致
pub fn engine_from_config(config: &CheckoutConfig) -> CouponEngine {
    let expiry_policy = if config.expiry_day_inclusive {
        ExpiryPolicy::LastDayInclusive
    } else {
        ExpiryPolicy::ExpiryDayExclusive
    };

    CouponEngine::new(EngineConfig {
        utc_offset_minutes: config.utc_offset_minutes,
        expiry_policy,
    })
}

/// 应付金额，不会为负
pub fn payable_amount(order_total: f64, discount: &DiscountResult) -> f64 {
    (order_total - discount.amount).max(0.0)
}
