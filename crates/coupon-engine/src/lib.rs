//! 优惠券引擎
//!
//! 结算页使用的优惠券资格判定与折扣计算：
//! - 判定用户持有的优惠券能否用于当前订单
//! - 计算百分比、满减、免运费、买一送一四类折扣
//! - 购物车按卖家分组汇总
//!
//! 全部为纯计算，不做 I/O，不持有状态。

pub mod bonus;
pub mod cart;
pub mod discount;
pub mod engine;
pub mod expiry;
pub mod models;

pub use bonus::{BONUS_ITEM_MAX_PRICE, is_bonus_candidate, select_buy_one_get_one_item};
pub use cart::{CartSummary, SellerGroup};
pub use discount::{OrderAmounts, round_half_up};
pub use engine::{
    AppliedCoupon, ApplyError, CouponEngine, CouponEvaluation, EngineConfig, IneligibleReason,
    OrderContext,
};
pub use expiry::{ExpiryClock, ExpiryPolicy};
pub use models::{
    CouponTemplate, DiscountResult, DiscountType, HeldCoupon, OrderLineItem, OrderType,
    TemplateCatalog,
};
