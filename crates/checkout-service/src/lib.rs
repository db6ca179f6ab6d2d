//! 结算服务
//!
//! 基于 `coupon-engine` 的结算编排与参考后端。
//!
//! # 主要模块
//!
//! - `checkout`: 结算试算与订单提交
//! - `client`: 优惠券后端接口及其 HTTP 实现
//! - `backend`: 内存版参考后端（axum）
//! - `store`: 并发内存存储
//! - `generators`: 演示数据生成
//! - `cli`: 命令行入口
//!
//! # 使用示例
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use checkout_service::checkout::{CheckoutService, CheckoutSession};
//! use checkout_service::client::HttpCouponBackend;
//! use coupon_engine::{OrderLineItem, OrderType};
//! use storefront_shared::config::AppConfig;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = AppConfig::default();
//! let backend = Arc::new(HttpCouponBackend::new(&config.backend)?);
//! let service = CheckoutService::from_config(backend, &config.checkout);
//!
//! let session = CheckoutSession::new("user-0001");
//! let items = vec![OrderLineItem::new("sku-1", 199.0, 1)];
//! let quote = service
//!     .quote(&session, OrderType::Direct, items, Some("CPN-1"))
//!     .await?;
//! let receipt = service.submit(&session, &quote).await?;
//! println!("{} 应付 {:.2}", receipt.order_id, receipt.payable);
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod checkout;
pub mod cli;
pub mod client;
pub mod generators;
pub mod models;
pub mod store;
