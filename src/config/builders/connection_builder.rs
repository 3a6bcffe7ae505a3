//! # 连接配置构建器模块
//!
//! 提供连接配置的构建器实现，支持链式调用和严格验证

use crate::config::core::{ConnectionConfig, ConnectionOptions};
use crate::error::GatewayError;
use rat_logger::info;

/// 连接配置构建器
#[derive(Debug, Default)]
pub struct ConnectionConfigBuilder {
    connection_string: Option<String>,
    options: ConnectionOptions,
}

impl ConnectionConfigBuilder {
    /// 创建新的构建器
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置连接字符串
    ///
    /// # 参数
    ///
    /// * `connection_string` - `mongodb://` 或 `mongodb+srv://` 开头的连接字符串
    pub fn connection_string<S: Into<String>>(mut self, connection_string: S) -> Self {
        self.connection_string = Some(connection_string.into());
        self
    }

    /// 设置服务器选择超时（毫秒）
    pub fn server_selection_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.options.server_selection_timeout_ms = Some(timeout_ms);
        self
    }

    /// 设置建立连接超时（毫秒）
    pub fn connect_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.options.connect_timeout_ms = Some(timeout_ms);
        self
    }

    /// 设置连接池大小范围
    pub fn pool_size(mut self, min: u32, max: u32) -> Self {
        self.options.min_pool_size = Some(min);
        self.options.max_pool_size = Some(max);
        self
    }

    /// 设置应用名，会出现在服务端日志中
    pub fn app_name<S: Into<String>>(mut self, app_name: S) -> Self {
        self.options.app_name = Some(app_name.into());
        self
    }

    /// 整体替换驱动选项
    pub fn options(mut self, options: ConnectionOptions) -> Self {
        self.options = options;
        self
    }

    /// 构建连接配置
    ///
    /// # 错误
    ///
    /// 连接字符串未设置、为空或协议不正确，以及连接池范围颠倒时返回错误
    pub fn build(self) -> Result<ConnectionConfig, GatewayError> {
        let connection_string = self.connection_string.ok_or_else(|| {
            crate::gateway_error!(config, "连接字符串必须设置")
        })?;

        if connection_string.trim().is_empty() {
            return Err(crate::gateway_error!(config, "连接字符串不能为空"));
        }

        if !connection_string.starts_with("mongodb://") && !connection_string.starts_with("mongodb+srv://") {
            return Err(crate::gateway_error!(
                config,
                format!("连接字符串必须以 mongodb:// 或 mongodb+srv:// 开头: {}", connection_string)
            ));
        }

        if let (Some(min), Some(max)) = (self.options.min_pool_size, self.options.max_pool_size) {
            if min > max {
                return Err(crate::gateway_error!(config, "最小连接数不能大于最大连接数"));
            }
        }

        if self.options.server_selection_timeout_ms == Some(0) {
            return Err(crate::gateway_error!(config, "服务器选择超时不能为零"));
        }

        let config = ConnectionConfig::new(connection_string, self.options);
        info!("创建连接配置: {}", config.redacted_connection_string());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_requires_connection_string() {
        assert!(ConnectionConfigBuilder::new().build().is_err());
        assert!(ConnectionConfigBuilder::new().connection_string("  ").build().is_err());
        assert!(ConnectionConfigBuilder::new().connection_string("postgres://x").build().is_err());
    }

    #[test]
    fn test_builder_validates_pool_range() {
        let result = ConnectionConfigBuilder::new()
            .connection_string("mongodb://localhost:27017/redm_dev")
            .pool_size(10, 2)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_sets_options() {
        let config = ConnectionConfigBuilder::new()
            .connection_string("mongodb://localhost:27017/redm_dev")
            .server_selection_timeout_ms(5000)
            .app_name("redm")
            .build()
            .unwrap();
        assert_eq!(config.options.server_selection_timeout_ms, Some(5000));
        assert_eq!(config.options.app_name.as_deref(), Some("redm"));
        assert!(config.options.use_new_url_parser);
    }
}
