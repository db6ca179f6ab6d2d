//! 购物车汇总
//!
//! 按卖家分组展示购物车，并计算引擎所需的商品小计。

use serde::{Deserialize, Serialize};

use crate::models::OrderLineItem;

/// 单个卖家的商品分组
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellerGroup {
    /// 未标注卖家的商品归入 `None` 分组
    pub seller_id: Option<String>,
    pub items: Vec<OrderLineItem>,
    pub subtotal: f64,
    pub item_count: u32,
}

/// 购物车汇总
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartSummary {
    pub groups: Vec<SellerGroup>,
    pub product_subtotal: f64,
    pub item_count: u32,
}

impl CartSummary {
    /// 按卖家首次出现的顺序分组
    pub fn from_items(items: &[OrderLineItem]) -> Self {
        let mut groups: Vec<SellerGroup> = Vec::new();

        for item in items {
            let group = match groups.iter().position(|g| g.seller_id == item.seller_id) {
                Some(index) => &mut groups[index],
                None => {
                    groups.push(SellerGroup {
                        seller_id: item.seller_id.clone(),
                        items: Vec::new(),
                        subtotal: 0.0,
                        item_count: 0,
                    });
                    let last = groups.len() - 1;
                    &mut groups[last]
                }
            };
            group.subtotal += item.line_total();
            group.item_count += item.quantity;
            group.items.push(item.clone());
        }

        // 按订单行顺序累加，与 OrderContext::from_items 的结果逐位一致
        let product_subtotal = items.iter().map(OrderLineItem::line_total).sum();
        let item_count = groups.iter().map(|g| g.item_count).sum();

        Self {
            groups,
            product_subtotal,
            item_count,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
