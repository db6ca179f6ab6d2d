//! storefront 命令行入口

use anyhow::Context;
use checkout_service::cli::{Cli, CommandRunner, Commands};
use clap::Parser;
use storefront_shared::config::AppConfig;
use storefront_shared::observability;

const SERVICE_NAME: &str = "checkout-service";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 不存在时忽略
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let mut config = AppConfig::load(SERVICE_NAME).context("加载配置失败")?;
    if let Some(level) = &cli.log_level {
        config.observability.log_level = level.clone();
    }

    let _guard = observability::init(&config.observability)
        .await
        .context("初始化可观测性失败")?;

    let runner = CommandRunner::new(config);

    match cli.command {
        Commands::Server {
            port,
            populate,
            user_count,
        } => {
            runner.run_server(port, populate, user_count).await?;
        }
        Commands::Quote { file, coupon, json } => {
            runner.run_quote(&file, coupon.as_deref(), json)?;
        }
        Commands::Populate { users, output } => {
            runner.run_populate(users, output.as_deref())?;
        }
    }

    Ok(())
}
