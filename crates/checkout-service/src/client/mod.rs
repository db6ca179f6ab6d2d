//! 优惠券后端客户端
//!
//! 结算流程通过 `CouponBackend` 访问模板、持有券和订单接口，
//! 生产环境使用 HTTP 实现，测试中使用 mockall 生成的替身。

mod http;

use async_trait::async_trait;
use coupon_engine::{CouponTemplate, HeldCoupon};
use storefront_shared::Result;

use crate::models::{OrderReceipt, SubmitOrderRequest};

pub use http::HttpCouponBackend;

/// 优惠券后端接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CouponBackend: Send + Sync {
    /// 全部优惠券模板
    async fn fetch_templates(&self) -> Result<Vec<CouponTemplate>>;

    /// 用户持有的优惠券
    async fn fetch_held_coupons(&self, user_id: &str) -> Result<Vec<HeldCoupon>>;

    /// 提交订单，非幂等
    async fn submit_order(&self, request: &SubmitOrderRequest) -> Result<OrderReceipt>;
}
