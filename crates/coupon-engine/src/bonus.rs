//! 买一送一赠品选择

use crate::models::OrderLineItem;

/// 可作为赠品的最高单价
pub const BONUS_ITEM_MAX_PRICE: f64 = 500.0;

/// 判断订单行能否作为赠品
///
/// 单价不超过上限，且库存（若有）还能多出一件赠品。
pub fn is_bonus_candidate(item: &OrderLineItem) -> bool {
    if item.price > BONUS_ITEM_MAX_PRICE {
        return false;
    }
    item.stock
        .is_none_or(|stock| u64::from(stock) >= u64::from(item.quantity) + 1)
}

/// 选出赠品：候选中单价最高者，同价取最先出现的一项
pub fn select_buy_one_get_one_item(items: &[OrderLineItem]) -> Option<&OrderLineItem> {
    items
        .iter()
        .filter(|item| is_bonus_candidate(item))
        .fold(None, |best: Option<&OrderLineItem>, item| match best {
            Some(current) if item.price <= current.price => Some(current),
            _ => Some(item),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_cap_is_inclusive() {
        assert!(is_bonus_candidate(&OrderLineItem::new("a", 500.0, 1)));
        assert!(!is_bonus_candidate(&OrderLineItem::new("b", 500.01, 1)));
    }

    #[test]
    fn test_stock_must_cover_bonus_unit() {
        assert!(is_bonus_candidate(&OrderLineItem::new("a", 100.0, 2).with_stock(3)));
        assert!(!is_bonus_candidate(&OrderLineItem::new("b", 100.0, 2).with_stock(2)));
        // 未知库存不限制
        assert!(is_bonus_candidate(&OrderLineItem::new("c", 100.0, 9)));
    }

    #[test]
    fn test_highest_price_wins() {
        let items = vec![
            OrderLineItem::new("low", 120.0, 1),
            OrderLineItem::new("high", 480.0, 1),
            OrderLineItem::new("mid", 300.0, 1),
        ];
        assert_eq!(select_buy_one_get_one_item(&items).unwrap().id, "high");
    }

    #[test]
    fn test_tie_keeps_first_in_order() {
        let items = vec![
            OrderLineItem::new("first", 300.0, 1),
            OrderLineItem::new("second", 300.0, 1),
        ];
        assert_eq!(select_buy_one_get_one_item(&items).unwrap().id, "first");
    }

    #[test]
    fn test_no_candidate() {
        let items = vec![
            OrderLineItem::new("pricey", 900.0, 1),
            OrderLineItem::new("sold-out", 100.0, 1).with_stock(1),
        ];
        assert!(select_buy_one_get_one_item(&items).is_none());
        assert!(select_buy_one_get_one_item(&[]).is_none());
    }
}
