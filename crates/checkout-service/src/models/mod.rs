//! 接口数据模型

pub mod coupon;
pub mod order;

pub use coupon::{
    CreateTemplateRequest, HeldCouponListResponse, IssueCouponRequest, TemplateListResponse,
};
pub use order::{OrderItemRequest, OrderReceipt, OrderStatus, SubmitOrderRequest};
