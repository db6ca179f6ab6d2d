//! 命令执行器
//!
//! 负责执行各 CLI 子命令的具体逻辑。

use std::fs;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use storefront_shared::config::AppConfig;
use tokio::net::TcpListener;
use tracing::{error, info};

use super::snapshot::QuoteSnapshot;
use crate::backend::{BackendState, router};
use crate::checkout::{CheckoutQuote, QuoteInput, build_quote, engine_from_config};
use crate::generators::{DataGenerator, GeneratorConfig};

/// 命令执行器
///
/// 持有加载好的应用配置，作为 CLI 与业务逻辑之间的桥梁。
pub struct CommandRunner {
    config: AppConfig,
}

impl CommandRunner {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// 执行 server 命令
    pub async fn run_server(
        &self,
        port: Option<u16>,
        populate: bool,
        user_count: usize,
    ) -> Result<()> {
        let addr = self.bind_addr(port);
        info!(addr = %addr, populate, user_count, "启动参考后端");

        let state = Arc::new(BackendState::from_config(&self.config.checkout));

        if populate {
            let generator = DataGenerator::new(GeneratorConfig {
                user_count,
                ..Default::default()
            });
            let stats = generator.populate_state(&state, Utc::now());
            info!(
                users = stats.users_count,
                templates = stats.templates_count,
                coupons = stats.coupons_count,
                "演示数据预填充完成"
            );
        }

        let app = router(state);

        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("绑定地址失败: {}", addr))?;

        info!("参考后端已启动: http://{}", addr);
        info!("可用端点:");
        info!("  GET /health, /ready - 健康检查");
        info!("  GET/POST /coupon-templates - 优惠券模板");
        info!("  GET/POST /users/{{user_id}}/coupons - 用户持有券");
        info!("  POST /orders, GET /orders/{{order_id}} - 订单");
        info!("按 Ctrl+C 停止服务");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("服务器运行失败")?;

        info!("参考后端已停止");
        Ok(())
    }

    /// 监听地址，命令行端口优先于配置
    fn bind_addr(&self, port: Option<u16>) -> String {
        match port {
            Some(port) => format!("{}:{}", self.config.server.host, port),
            None => self.config.server_addr(),
        }
    }

    /// 执行 quote 命令，完全离线
    pub fn run_quote(&self, file: &str, coupon: Option<&str>, json: bool) -> Result<()> {
        let content =
            fs::read_to_string(file).with_context(|| format!("读取快照文件失败: {}", file))?;
        let snapshot = QuoteSnapshot::from_json(&content)
            .with_context(|| format!("解析快照文件失败: {}", file))?;

        let quote = self.quote_snapshot(&snapshot, coupon);

        if json {
            let output = serde_json::to_string_pretty(&quote).context("序列化试算结果失败")?;
            println!("{}", output);
        } else {
            print_quote(&quote);
        }

        Ok(())
    }

    fn quote_snapshot(&self, snapshot: &QuoteSnapshot, coupon: Option<&str>) -> CheckoutQuote {
        let engine = engine_from_config(&self.config.checkout);
        let templates = snapshot.catalog();

        build_quote(
            &engine,
            QuoteInput {
                user_id: &snapshot.user_id,
                order_type: snapshot.order_type,
                items: &snapshot.items,
                shipping_fee: snapshot
                    .shipping_fee
                    .unwrap_or(self.config.checkout.shipping_fee),
                held_coupons: &snapshot.held_coupons,
                templates: &templates,
                selected_coupon_id: coupon,
                now: snapshot.now.unwrap_or_else(Utc::now),
            },
        )
    }

    /// 执行 populate 命令
    pub fn run_populate(&self, users: usize, output: Option<&str>) -> Result<()> {
        info!(users, "批量生成演示数据");

        let generator = DataGenerator::new(GeneratorConfig {
            user_count: users,
            ..Default::default()
        });
        let dataset = generator.generate(Utc::now());

        if let Some(path) = output {
            let json = serde_json::to_string_pretty(&dataset).context("序列化数据失败")?;
            fs::write(path, json).with_context(|| format!("写入文件失败: {}", path))?;
            info!(path, "数据已输出到文件");
        }

        println!("\n数据生成完成:");
        println!("{}", "-".repeat(30));
        println!("用户数量: {}", users);
        println!("模板数量: {}", dataset.templates.len());
        println!("持有券数量: {}", dataset.held_coupons.len());
        println!("{}", "-".repeat(30));

        Ok(())
    }
}

// ============================================================================
// 辅助函数
// ============================================================================

fn print_quote(quote: &CheckoutQuote) {
    println!("\n结算试算 ({}, {})", quote.user_id, quote.order_type.as_str());
    println!("{}", "-".repeat(50));
    for group in &quote.cart.groups {
        println!(
            "卖家 {}: {} 件, 小计 {:.2}",
            group.seller_id.as_deref().unwrap_or("-"),
            group.item_count,
            group.subtotal
        );
    }
    println!("商品小计: {:.2}", quote.product_subtotal);
    println!("运费: {:.2}", quote.shipping_fee);
    println!("订单总额: {:.2}", quote.order_total);

    println!("\n可用优惠券 ({}):", quote.eligible.len());
    for coupon in &quote.eligible {
        println!(
            "  {} [{}] {} - 预计优惠 {:.2}",
            coupon.coupon_id,
            coupon.discount_type.as_str(),
            coupon.template_name,
            coupon.discount.amount
        );
    }

    println!("\n不可用优惠券 ({}):", quote.ineligible.len());
    for rejection in &quote.ineligible {
        println!("  {} - {}", rejection.coupon_id, rejection.message);
    }

    if let Some(applied) = &quote.applied {
        println!("\n已选优惠券: {} 优惠 {:.2}", applied.coupon_id, applied.discount.amount);
        if applied.discount.is_freeship {
            println!("  免运费");
        }
        if let Some(bonus) = &applied.discount.bonus_item {
            println!("  赠品: {} ({:.2})", bonus.id, bonus.price);
        }
    }
    if let Some(rejection) = &quote.rejected_selection {
        println!(
            "\n所选优惠券 {} 不可用: {}",
            rejection.coupon_id, rejection.message
        );
    }

    println!("{}", "-".repeat(50));
    println!("应付金额: {:.2}", quote.payable);
}

/// 等待关闭信号
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("收到关闭信号，正在停止服务..."),
        Err(e) => {
            error!(error = %e, "安装 Ctrl+C 信号处理器失败，仅能通过终止进程停止");
            std::future::pending::<()>().await;
        }
    }
}

// ============================================================================
// 单元测试
// ============================================================================
