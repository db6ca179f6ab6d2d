//! CLI 模块
//!
//! - `server` - 启动参考后端
//! - `quote` - 读取结算快照离线试算
//! - `populate` - 批量生成演示数据
//!
//! # 使用示例
//!
//! ```bash
//! # 启动服务器并预填充数据
//! storefront server --port 8090 --populate
//!
//! # 离线试算
//! storefront quote -f demos/quote_snapshot.json -c CPN-BOGO
//!
//! # 批量生成数据
//! storefront populate -u 50 -o data.json
//! ```

pub mod commands;
pub mod runner;
pub mod snapshot;

pub use commands::{Cli, Commands};
pub use runner::CommandRunner;
pub use snapshot::QuoteSnapshot;
