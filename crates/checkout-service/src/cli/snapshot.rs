//! 离线结算快照

use chrono::{DateTime, Utc};
use coupon_engine::{CouponTemplate, HeldCoupon, OrderLineItem, OrderType, TemplateCatalog};
use serde::Deserialize;

fn default_user_id() -> String {
    "offline".to_string()
}

/// `quote` 命令读取的快照文件
///
/// `shipping_fee` 与 `now` 缺省时分别取配置中的运费和当前时间。
#[derive(Debug, Clone, Deserialize)]
pub struct QuoteSnapshot {
    #[serde(default = "default_user_id")]
    pub user_id: String,
    pub order_type: OrderType,
    pub items: Vec<OrderLineItem>,
    #[serde(default)]
    pub held_coupons: Vec<HeldCoupon>,
    #[serde(default)]
    pub templates: Vec<CouponTemplate>,
    pub shipping_fee: Option<f64>,
    pub now: Option<DateTime<Utc>>,
}

impl QuoteSnapshot {
    pub fn from_json(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str(content)
    }

    pub fn catalog(&self) -> TemplateCatalog {
        self.templates.iter().cloned().collect()
    }
}
