//! # 配置构建器模块

pub mod connection_builder;
pub mod logging_builder;

pub use connection_builder::ConnectionConfigBuilder;
pub use logging_builder::LoggingConfigBuilder;
