//! # 配置管理模块
//!
//! 连接配置来自运行时的具名配置变量，这里负责读取、校验和构建

pub mod builders;
pub mod core;
pub mod loader;
pub mod source;

// 重新导出所有公共类型
pub use builders::{ConnectionConfigBuilder, LoggingConfigBuilder};
pub use core::{
    redact_connection_string, ConnectionConfig, ConnectionOptions, Environment, LogLevel,
    LoggingConfig,
};
pub use loader::{is_development_server, load_connection_config, load_profile, resolve_environment};
pub use source::{ConfigSource, EnvSource, FileSource, LayeredSource, MapSource};
