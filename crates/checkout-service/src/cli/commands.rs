//! CLI 命令定义
//!
//! 使用 clap derive 宏定义命令行接口结构。

use clap::{Parser, Subcommand};

/// 结算服务命令行工具
///
/// 使用 `--help` 查看各子命令的详细说明。
#[derive(Parser, Debug)]
#[command(name = "storefront")]
#[command(version, about = "优惠券结算服务工具")]
#[command(propagate_version = true)]
pub struct Cli {
    /// 日志级别 (trace, debug, info, warn, error)，不传则使用配置文件
    #[arg(short, long)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 启动参考后端（HTTP REST API）
    ///
    /// 提供优惠券模板、用户持有券和订单提交接口。
    Server {
        /// 服务端口，不传则使用配置文件
        #[arg(short, long)]
        port: Option<u16>,

        /// 是否预填充演示数据
        #[arg(long)]
        populate: bool,

        /// 预填充用户数量
        #[arg(long, default_value = "100")]
        user_count: usize,
    },

    /// 离线试算
    ///
    /// 读取 JSON 结算快照（订单类型、商品、持有券、模板），
    /// 输出可用券、不可用原因以及选中券的折扣。
    Quote {
        /// 快照文件路径
        #[arg(short, long)]
        file: String,

        /// 选中的优惠券 ID
        #[arg(short, long)]
        coupon: Option<String>,

        /// 以 JSON 输出完整试算结果
        #[arg(long)]
        json: bool,
    },

    /// 批量生成演示数据
    Populate {
        /// 用户数量
        #[arg(short, long, default_value = "100")]
        users: usize,

        /// 输出到文件（JSON 格式）
        #[arg(short, long)]
        output: Option<String>,
    },
}

// ============================================================================
// 单元测试
// ============================================================================
