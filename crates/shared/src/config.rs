//! 配置管理模块
//!
//! 支持多格式配置文件加载，环境变量覆盖，以及类型安全的配置访问。

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::observability::ObservabilityConfig;

/// 服务配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8090,
        }
    }
}

/// 结算规则配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CheckoutConfig {
    /// 统一运费
    pub shipping_fee: f64,
    /// 按日判断优惠券过期时使用的时区偏移（分钟）
    pub utc_offset_minutes: i32,
    /// 过期日当天是否仍可使用
    pub expiry_day_inclusive: bool,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            shipping_fee: 60.0,
            utc_offset_minutes: 0,
            expiry_day_inclusive: true,
        }
    }
}

/// 优惠券后端客户端配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendClientConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
    /// 查询类请求的最大重试次数，提交订单不重试
    pub max_retries: u32,
}

impl Default for BackendClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8090".to_string(),
            timeout_seconds: 10,
            max_retries: 2,
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub service_name: String,
    pub environment: String,
    pub server: ServerConfig,
    pub checkout: CheckoutConfig,
    pub backend: BackendClientConfig,
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 加载顺序（后加载的会覆盖先加载的同名配置项）：
    /// 1. config/default.toml（默认配置）
    /// 2. config/{environment}.toml（环境特定配置）
    /// 3. config/{service_name}.toml（服务特定配置）
    /// 4. 环境变量（STOREFRONT_ 前缀，层级用双下划线，
    ///    如 STOREFRONT_CHECKOUT__SHIPPING_FEE -> checkout.shipping_fee）
    /// 5. 服务特定端口环境变量（如 CHECKOUT_SERVICE_PORT）
    pub fn load(service_name: &str) -> Result<Self, ConfigError> {
        let env = std::env::var("STOREFRONT_ENV").unwrap_or_else(|_| "development".to_string());
        let config_dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

        let mut config = Self::load_from(Path::new(&config_dir), &env, service_name)?;

        if let Some(port) = Self::get_service_port_from_env(service_name) {
            config.server.port = port;
        }

        Ok(config)
    }

    /// 从指定目录加载配置，文件均为可选
    pub fn load_from(config_dir: &Path, env: &str, service_name: &str) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .set_default("service_name", service_name)?
            .set_default("environment", env)?
            .set_default("observability.service_name", service_name)?
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(File::from(config_dir.join(format!("{}.toml", env))).required(false))
            .add_source(
                File::from(config_dir.join(format!("{}.toml", service_name))).required(false),
            )
            .add_source(
                Environment::with_prefix("STOREFRONT")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// 服务特定端口：将 "my-service-name" 转换为 "MY_SERVICE_NAME_PORT"
    fn get_service_port_from_env(service_name: &str) -> Option<u16> {
        std::env::var(Self::service_port_env_var(service_name))
            .ok()
            .and_then(|v| v.parse().ok())
    }

    fn service_port_env_var(service_name: &str) -> String {
        format!("{}_PORT", service_name.to_uppercase().replace('-', "_"))
    }

    /// 获取服务地址
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8090);
        assert_eq!(config.checkout.shipping_fee, 60.0);
        assert!(config.checkout.expiry_day_inclusive);
        assert_eq!(config.backend.max_retries, 2);
    }

    #[test]
    fn test_server_addr() {
        let config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            ..Default::default()
        };
        assert_eq!(config.server_addr(), "127.0.0.1:3000");
    }

    #[test]
    fn test_load_without_files_uses_defaults() {
        let config = AppConfig::load_from(
            Path::new("/nonexistent/storefront-config"),
            "test",
            "checkout-service",
        )
        .unwrap();

        assert_eq!(config.service_name, "checkout-service");
        assert_eq!(config.environment, "test");
        assert_eq!(config.observability.service_name, "checkout-service");
        assert!(!config.is_production());
    }

    #[test]
    fn test_service_port_env_var_name() {
        assert_eq!(
            AppConfig::service_port_env_var("checkout-service"),
            "CHECKOUT_SERVICE_PORT"
        );
    }
}
