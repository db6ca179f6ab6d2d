//! 优惠券过期判定
//!
//! 按自然日比较：当前时间与过期时间都换算到同一时区后截断到当天零点再比较，
//! 避免边界日因时分秒不同而出现误差。

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use serde::{Deserialize, Serialize};

/// 过期日当天是否仍可使用
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryPolicy {
    /// 过期日是最后一个可用日
    #[default]
    LastDayInclusive,
    /// 过期日当天即不可用
    ExpiryDayExclusive,
}

/// 按日粒度的过期判定器
#[derive(Debug, Clone, Copy)]
pub struct ExpiryClock {
    offset: FixedOffset,
    policy: ExpiryPolicy,
}

impl Default for ExpiryClock {
    fn default() -> Self {
        Self::new(Utc.fix(), ExpiryPolicy::default())
    }
}

impl ExpiryClock {
    pub fn new(offset: FixedOffset, policy: ExpiryPolicy) -> Self {
        Self { offset, policy }
    }

    /// 根据分钟偏移创建，非法偏移回退到 UTC
    pub fn from_offset_minutes(minutes: i32, policy: ExpiryPolicy) -> Self {
        let offset = minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix());
        Self::new(offset, policy)
    }

    pub fn policy(&self) -> ExpiryPolicy {
        self.policy
    }

    /// 截断到本地日期
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }

    pub fn is_expired(&self, expire_time: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        let expire_day = self.local_date(expire_time);
        let today = self.local_date(now);
        match self.policy {
            ExpiryPolicy::LastDayInclusive => expire_day < today,
            ExpiryPolicy::ExpiryDayExclusive => expire_day <= today,
        }
    }
}
