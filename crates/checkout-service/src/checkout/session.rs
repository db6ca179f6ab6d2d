//! 结算会话

use serde::{Deserialize, Serialize};

/// 结算会话
///
/// 当前登录用户的身份，显式传给每个需要身份的操作。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub user_id: String,
}

impl CheckoutSession {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}
