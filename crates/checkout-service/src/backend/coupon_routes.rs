//! 优惠券模板与持有券接口

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use chrono::Utc;
use coupon_engine::{CouponTemplate, DiscountType, HeldCoupon};
use storefront_shared::{Result, StorefrontError};
use tracing::info;
use validator::Validate;

use super::BackendState;
use crate::models::{
    CreateTemplateRequest, HeldCouponListResponse, IssueCouponRequest, TemplateListResponse,
};

// ============================================================================
// 路由配置
// ============================================================================

pub fn coupon_routes() -> Router<Arc<BackendState>> {
    Router::new()
        .route(
            "/coupon-templates",
            get(list_templates).post(create_template),
        )
        .route(
            "/users/{user_id}/coupons",
            get(list_user_coupons).post(issue_coupon),
        )
}

// ============================================================================
// 端点处理函数
// ============================================================================

/// 全部模板，按 ID 排序
#[tracing::instrument(skip(state))]
async fn list_templates(State(state): State<Arc<BackendState>>) -> Json<TemplateListResponse> {
    let mut templates = state.templates.list();
    templates.sort_by(|a, b| a.id.cmp(&b.id));

    let total = templates.len();
    Json(TemplateListResponse { templates, total })
}

/// 创建模板
#[tracing::instrument(skip(state))]
async fn create_template(
    State(state): State<Arc<BackendState>>,
    Json(req): Json<CreateTemplateRequest>,
) -> Result<(StatusCode, Json<CouponTemplate>)> {
    req.validate()?;

    if req.discount_type == DiscountType::Unknown {
        return Err(StorefrontError::InvalidArgument {
            field: "discount_type".to_string(),
            message: "不支持的折扣类型".to_string(),
        });
    }

    let template = req.into_template();
    if !state.templates.insert_if_absent(&template.id, template.clone()) {
        return Err(StorefrontError::AlreadyExists {
            entity: "CouponTemplate".to_string(),
            field: "id".to_string(),
            value: template.id,
        });
    }

    info!(template_id = %template.id, discount_type = template.discount_type.as_str(), "模板已创建");

    Ok((StatusCode::CREATED, Json(template)))
}

/// 用户持有的券
#[tracing::instrument(skip(state))]
async fn list_user_coupons(
    State(state): State<Arc<BackendState>>,
    Path(user_id): Path<String>,
) -> Json<HeldCouponListResponse> {
    let coupons = state.held_coupons(&user_id);
    let total = coupons.len();
    Json(HeldCouponListResponse { coupons, total })
}

/// 按模板给用户发券
#[tracing::instrument(skip(state))]
async fn issue_coupon(
    State(state): State<Arc<BackendState>>,
    Path(user_id): Path<String>,
    Json(req): Json<IssueCouponRequest>,
) -> Result<(StatusCode, Json<HeldCoupon>)> {
    req.validate()?;

    if !state.templates.contains(&req.template_id) {
        return Err(StorefrontError::NotFound {
            entity: "CouponTemplate".to_string(),
            id: req.template_id,
        });
    }

    let coupon = req.into_coupon(&user_id, Utc::now());
    state.coupons.insert(&coupon.id, coupon.clone());
    info!(coupon_id = %coupon.id, %user_id, "优惠券已发放");

    Ok((StatusCode::CREATED, Json(coupon)))
}

// ============================================================================
// 单元测试
// ============================================================================
