//! 演示数据生成器
//!
//! 生成一套固定的优惠券模板，并为一批用户随机发放持有券，
//! 用于填充参考后端或导出为 JSON。

use std::ops::Range;

use chrono::{DateTime, Duration, Utc};
use coupon_engine::{CouponTemplate, DiscountType, HeldCoupon};
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::Serialize;
use uuid::Uuid;

use crate::backend::BackendState;

/// 生成器配置
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub user_count: usize,
    /// 每个用户持有券数量范围
    pub coupons_per_user: Range<usize>,
    /// 有效期天数范围，下限为负时会生成已过期的券
    pub valid_days: Range<i64>,
}

impl Default for GeneratorConfig {
    /// 默认 100 用户，每人 1-5 张券，有效期 -3 到 30 天
    fn default() -> Self {
        Self {
            user_count: 100,
            coupons_per_user: 1..6,
            valid_days: -3..31,
        }
    }
}

/// 生成的数据集
#[derive(Debug, Clone, Serialize)]
pub struct DemoDataset {
    pub templates: Vec<CouponTemplate>,
    pub held_coupons: Vec<HeldCoupon>,
}

/// 数据生成统计
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationStats {
    pub users_count: usize,
    pub templates_count: usize,
    pub coupons_count: usize,
}

pub struct DataGenerator {
    config: GeneratorConfig,
}

impl DataGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    /// 固定的演示模板，覆盖四种折扣类型
    pub fn demo_templates() -> Vec<CouponTemplate> {
        let template = |id: &str,
                        name: &str,
                        discount_type: DiscountType,
                        value: f64,
                        min: Option<f64>| CouponTemplate {
            id: id.to_string(),
            name: name.to_string(),
            discount_type,
            discount_value: value,
            min_purchase_amount: min,
        };

        vec![
            template("tpl-pct-10", "全场九折", DiscountType::Percent, 0.1, None),
            template("tpl-pct-20-min1000", "满1000享八折", DiscountType::Percent, 0.2, Some(1000.0)),
            template("tpl-fixed-50", "立减50", DiscountType::Fixed, 50.0, None),
            template("tpl-fixed-300-min2000", "满2000减300", DiscountType::Fixed, 300.0, Some(2000.0)),
            template("tpl-freeship", "免运费", DiscountType::Freeship, 0.0, None),
            template("tpl-bogo", "买一送一", DiscountType::BuyOneGetOne, 0.0, Some(300.0)),
        ]
    }

    /// 为指定用户随机发券
    pub fn generate_coupons(
        &self,
        user_id: &str,
        templates: &[CouponTemplate],
        now: DateTime<Utc>,
    ) -> Vec<HeldCoupon> {
        let mut rng = rand::rng();
        let count = rng.random_range(self.config.coupons_per_user.clone());

        let mut coupons = Vec::with_capacity(count);
        for _ in 0..count {
            let Some(template) = templates.choose(&mut rng) else {
                break;
            };
            let valid_days = rng.random_range(self.config.valid_days.clone());
            coupons.push(HeldCoupon {
                id: format!("CPN-{}", Uuid::new_v4().simple()),
                user_id: user_id.to_string(),
                template_id: template.id.clone(),
                remaining_usage: rng.random_range(0..3),
                expire_time: now + Duration::days(valid_days),
            });
        }
        coupons
    }

    pub fn generate(&self, now: DateTime<Utc>) -> DemoDataset {
        let templates = Self::demo_templates();
        let held_coupons = (1..=self.config.user_count)
            .flat_map(|n| self.generate_coupons(&user_id(n), &templates, now))
            .collect();

        DemoDataset {
            templates,
            held_coupons,
        }
    }

    /// 生成数据并写入后端存储
    pub fn populate_state(&self, state: &BackendState, now: DateTime<Utc>) -> GenerationStats {
        let dataset = self.generate(now);

        state
            .templates
            .insert_many(dataset.templates, |t| t.id.clone());
        state
            .coupons
            .insert_many(dataset.held_coupons, |c| c.id.clone());

        GenerationStats {
            users_count: self.config.user_count,
            templates_count: state.templates.count(),
            coupons_count: state.coupons.count(),
        }
    }
}

/// 演示用户 ID，从 1 开始编号
pub fn user_id(n: usize) -> String {
    format!("user-{:04}", n)
}
