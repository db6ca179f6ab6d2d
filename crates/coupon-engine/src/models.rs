//! 优惠券数据模型
//!
//! 模板与用户持有的优惠券均由后端创建和修改，这里只描述其快照结构。
//! 订单行由购物车状态在结算时临时构造。

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 订单类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    /// 直接购买
    Direct,
    /// 拍卖成交，不参与任何优惠
    Auction,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "DIRECT",
            Self::Auction => "AUCTION",
        }
    }
}

/// 折扣类型
///
/// 无法识别的类型字符串反序列化为 `Unknown`，计算时折扣为 0。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountType {
    /// 按比例折扣，`discount_value` 为 0-1 的小数
    Percent,
    /// 固定金额立减
    Fixed,
    /// 免运费
    Freeship,
    /// 买一送一
    BuyOneGetOne,
    #[serde(other)]
    Unknown,
}

impl DiscountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Percent => "PERCENT",
            Self::Fixed => "FIXED",
            Self::Freeship => "FREESHIP",
            Self::BuyOneGetOne => "BUY_ONE_GET_ONE",
            Self::Unknown => "UNKNOWN",
        }
    }
}

/// 优惠券模板（折扣规则）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouponTemplate {
    pub id: String,
    pub name: String,
    pub discount_type: DiscountType,
    #[serde(default)]
    pub discount_value: f64,
    /// 最低消费门槛，按商品小计 + 运费计算
    #[serde(default)]
    pub min_purchase_amount: Option<f64>,
}

/// 用户持有的优惠券实例
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeldCoupon {
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    pub template_id: String,
    pub remaining_usage: i32,
    pub expire_time: DateTime<Utc>,
}

/// 订单行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLineItem {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub seller_id: Option<String>,
    pub price: f64,
    pub quantity: u32,
    /// 库存，存在时约束买一送一的赠品资格
    #[serde(default)]
    pub stock: Option<u32>,
}

impl OrderLineItem {
    pub fn new(id: impl Into<String>, price: f64, quantity: u32) -> Self {
        Self {
            id: id.into(),
            name: None,
            seller_id: None,
            price,
            quantity,
            stock: None,
        }
    }

    pub fn with_stock(mut self, stock: u32) -> Self {
        self.stock = Some(stock);
        self
    }

    pub fn with_seller(mut self, seller_id: impl Into<String>) -> Self {
        self.seller_id = Some(seller_id.into());
        self
    }

    /// 行小计
    pub fn line_total(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }
}

/// 折扣计算结果，仅用于展示和提交，最终以后端校验为准
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscountResult {
    pub amount: f64,
    pub is_freeship: bool,
    pub bonus_item: Option<OrderLineItem>,
}

impl DiscountResult {
    pub fn none() -> Self {
        Self {
            amount: 0.0,
            is_freeship: false,
            bonus_item: None,
        }
    }
}

/// 优惠券模板查找表
#[derive(Debug, Clone, Default)]
pub struct TemplateCatalog {
    templates: HashMap<String, CouponTemplate>,
}

impl TemplateCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, template: CouponTemplate) {
        self.templates.insert(template.id.clone(), template);
    }

    pub fn get(&self, id: &str) -> Option<&CouponTemplate> {
        self.templates.get(id)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl FromIterator<CouponTemplate> for TemplateCatalog {
    fn from_iter<I: IntoIterator<Item = CouponTemplate>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for template in iter {
            catalog.insert(template);
        }
        catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discount_type_wire_names() {
        let json = serde_json::to_string(&DiscountType::BuyOneGetOne).unwrap();
        assert_eq!(json, "\"BUY_ONE_GET_ONE\"");

        let parsed: DiscountType = serde_json::from_str("\"FREESHIP\"").unwrap();
        assert_eq!(parsed, DiscountType::Freeship);
    }

    #[test]
    fn test_unknown_discount_type_does_not_fail() {
        let parsed: DiscountType = serde_json::from_str("\"LOYALTY_POINTS\"").unwrap();
        assert_eq!(parsed, DiscountType::Unknown);

        let template: CouponTemplate = serde_json::from_str(
            r#"{"id":"t-1","name":"积分券","discount_type":"LOYALTY_POINTS","discount_value":3}"#,
        )
        .unwrap();
        assert_eq!(template.discount_type, DiscountType::Unknown);
        assert!(template.min_purchase_amount.is_none());
    }

    #[test]
    fn test_template_catalog_lookup() {
        let catalog: TemplateCatalog = vec![CouponTemplate {
            id: "tpl-fixed".to_string(),
            name: "满减".to_string(),
            discount_type: DiscountType::Fixed,
            discount_value: 50.0,
            min_purchase_amount: Some(300.0),
        }]
        .into_iter()
        .collect();

        assert_eq!(catalog.len(), 1);
        assert!(catalog.get("tpl-fixed").is_some());
        assert!(catalog.get("tpl-missing").is_none());
    }

    #[test]
    fn test_line_total() {
        let item = OrderLineItem::new("line-1", 120.0, 3);
        assert!((item.line_total() - 360.0).abs() < f64::EPSILON);
    }
}
