//! 订单提交请求与回执

use chrono::{DateTime, Utc};
use coupon_engine::{DiscountResult, OrderLineItem, OrderType};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// 订单行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct OrderItemRequest {
    #[validate(length(min = 1, message = "商品 ID 不能为空"))]
    pub id: String,
    pub name: Option<String>,
    pub seller_id: Option<String>,
    #[validate(range(min = 0.0, message = "商品单价不能为负"))]
    pub price: f64,
    #[validate(range(min = 1, max = 999, message = "购买数量必须在1-999之间"))]
    pub quantity: u32,
    pub stock: Option<u32>,
}

impl From<&OrderLineItem> for OrderItemRequest {
    fn from(item: &OrderLineItem) -> Self {
        Self {
            id: item.id.clone(),
            name: item.name.clone(),
            seller_id: item.seller_id.clone(),
            price: item.price,
            quantity: item.quantity,
            stock: item.stock,
        }
    }
}

impl From<&OrderItemRequest> for OrderLineItem {
    fn from(item: &OrderItemRequest) -> Self {
        Self {
            id: item.id.clone(),
            name: item.name.clone(),
            seller_id: item.seller_id.clone(),
            price: item.price,
            quantity: item.quantity,
            stock: item.stock,
        }
    }
}

/// 提交订单请求
///
/// `client_discount` 是客户端试算的折扣，仅用于对账，服务端以自己的计算为准。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct SubmitOrderRequest {
    #[validate(length(min = 1, max = 64, message = "用户 ID 长度必须在1-64个字符之间"))]
    pub user_id: String,
    pub order_type: OrderType,
    #[validate(length(min = 1, message = "订单至少包含一个商品"), nested)]
    pub items: Vec<OrderItemRequest>,
    pub coupon_id: Option<String>,
    pub client_discount: Option<f64>,
}

impl SubmitOrderRequest {
    pub fn line_items(&self) -> Vec<OrderLineItem> {
        self.items.iter().map(OrderLineItem::from).collect()
    }
}

/// 订单状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Accepted,
}

/// 订单回执
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderReceipt {
    pub order_id: String,
    pub user_id: String,
    pub order_type: OrderType,
    pub status: OrderStatus,
    pub items: Vec<OrderLineItem>,
    pub product_subtotal: f64,
    pub shipping_fee: f64,
    pub order_total: f64,
    pub coupon_id: Option<String>,
    pub discount: DiscountResult,
    pub payable: f64,
    pub created_at: DateTime<Utc>,
}
