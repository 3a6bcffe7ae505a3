//! # 按环境加载连接配置
//!
//! 变量名与默认值：
//! - `mongodb_env`：dev / test / prod，缺省时按 `sv_hostname` 推断
//! - `mongodb_<env>_url`：缺省为 `mongodb://localhost:27017/redm_<env>`
//! - `mongodb_timeout`：服务器选择超时（毫秒），缺省 dev 5000 / prod 10000 / test 2000

use crate::config::core::{ConnectionConfig, ConnectionOptions, Environment};
use crate::config::source::ConfigSource;
use crate::error::GatewayResult;
use rat_logger::info;

pub const ENV_VAR: &str = "mongodb_env";
pub const HOSTNAME_VAR: &str = "sv_hostname";
pub const TIMEOUT_VAR: &str = "mongodb_timeout";

/// 服务器名是否像开发服务器
pub fn is_development_server(hostname: &str) -> bool {
    let hostname = hostname.to_lowercase();
    ["dev", "test", "local"].iter().any(|marker| hostname.contains(marker))
}

/// 确定当前运行环境
pub fn resolve_environment(source: &dyn ConfigSource) -> GatewayResult<Environment> {
    let hostname = source.get_or(HOSTNAME_VAR, "");
    let fallback = if is_development_server(&hostname) {
        Environment::Dev
    } else {
        Environment::Prod
    };

    match source.get(ENV_VAR) {
        Some(value) if !value.trim().is_empty() => Environment::parse(&value),
        _ => Ok(fallback),
    }
}

/// 连接字符串变量名
pub fn url_var(environment: Environment) -> String {
    format!("mongodb_{}_url", environment.as_str())
}

/// 加载指定环境的连接配置
pub fn load_profile(source: &dyn ConfigSource, environment: Environment) -> GatewayResult<ConnectionConfig> {
    let connection_string = source.get_or(&url_var(environment), &environment.default_connection_string());

    let timeout_text = source.get_or(TIMEOUT_VAR, &environment.default_timeout_ms().to_string());
    let timeout_ms: u64 = timeout_text.trim().parse().map_err(|_| {
        crate::gateway_error!(config, format!("{} 不是有效的毫秒数: {}", TIMEOUT_VAR, timeout_text))
    })?;

    let options = ConnectionOptions {
        server_selection_timeout_ms: Some(timeout_ms),
        ..ConnectionOptions::default()
    };

    Ok(ConnectionConfig::new(connection_string, options))
}

/// 加载当前环境的连接配置
pub fn load_connection_config(source: &dyn ConfigSource) -> GatewayResult<ConnectionConfig> {
    let environment = resolve_environment(source)?;
    info!("[CFX-MongoDB] Environment: {}", environment);

    let config = load_profile(source, environment)?;
    info!("[MongoDB] Configuring connection with {}", config.redacted_connection_string());
    Ok(config)
}
