//! 优惠券相关请求与响应

use chrono::{DateTime, Duration, Utc};
use coupon_engine::{CouponTemplate, DiscountType, HeldCoupon};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// 创建模板请求
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateTemplateRequest {
    /// 不传则由服务端生成
    #[validate(length(min = 1, max = 64, message = "模板 ID 长度必须在1-64个字符之间"))]
    pub id: Option<String>,
    #[validate(length(min = 1, max = 100, message = "模板名称长度必须在1-100个字符之间"))]
    pub name: String,
    pub discount_type: DiscountType,
    #[serde(default)]
    #[validate(range(min = 0.0, message = "折扣值不能为负"))]
    pub discount_value: f64,
    #[validate(range(min = 0.0, message = "最低消费不能为负"))]
    pub min_purchase_amount: Option<f64>,
}

impl CreateTemplateRequest {
    pub fn into_template(self) -> CouponTemplate {
        CouponTemplate {
            id: self
                .id
                .unwrap_or_else(|| format!("TPL-{}", Uuid::new_v4().simple())),
            name: self.name,
            discount_type: self.discount_type,
            discount_value: self.discount_value,
            min_purchase_amount: self.min_purchase_amount,
        }
    }
}

fn default_usage() -> i32 {
    1
}

/// 发放持有券请求
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct IssueCouponRequest {
    #[validate(length(min = 1, message = "模板 ID 不能为空"))]
    pub template_id: String,
    /// 可用次数
    #[serde(default = "default_usage")]
    #[validate(range(min = 1, max = 100, message = "可用次数必须在1-100之间"))]
    pub usage: i32,
    /// 有效期天数，0 表示当天到期
    #[validate(range(min = 0, max = 3650, message = "有效期必须在0-3650天之间"))]
    pub valid_days: i64,
}

impl IssueCouponRequest {
    pub fn into_coupon(self, user_id: &str, now: DateTime<Utc>) -> HeldCoupon {
        HeldCoupon {
            id: format!("CPN-{}", Uuid::new_v4().simple()),
            user_id: user_id.to_string(),
            template_id: self.template_id,
            remaining_usage: self.usage,
            expire_time: now + Duration::days(self.valid_days),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateListResponse {
    pub templates: Vec<CouponTemplate>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeldCouponListResponse {
    pub coupons: Vec<HeldCoupon>,
    pub total: usize,
}
