//! 日志初始化辅助
//!
//! 库本身不会初始化日志系统，宿主可以按需调用 [`init_logger`]

use crate::config::{LogLevel, LoggingConfig};
use rat_logger::{LevelFilter, LoggerBuilder};
use rat_logger::handler::term::TermConfig;

/// 将配置中的日志级别映射为rat_logger的级别
pub fn level_filter(level: LogLevel) -> LevelFilter {
    match level {
        LogLevel::Error => LevelFilter::Error,
        LogLevel::Warn => LevelFilter::Warn,
        LogLevel::Info => LevelFilter::Info,
        LogLevel::Debug => LevelFilter::Debug,
        LogLevel::Trace => LevelFilter::Trace,
    }
}

/// 按配置初始化全局日志器
///
/// 全局日志器只能初始化一次，重复调用返回false
pub fn init_logger(config: &LoggingConfig) -> bool {
    let mut builder = LoggerBuilder::new().with_level(level_filter(config.level));
    if config.console {
        builder = builder.add_terminal_with_config(TermConfig::default());
    }
    builder.init().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoggingConfigBuilder;

    #[test]
    fn test_builder_requires_all_fields() {
        assert!(LoggingConfigBuilder::new().level(LogLevel::Info).build().is_err());

        let config = LoggingConfigBuilder::new()
            .level(LogLevel::Warn)
            .console(true)
            .build()
            .unwrap();
        assert!(matches!(level_filter(config.level), LevelFilter::Warn));
        assert!(matches!(level_filter(LogLevel::Trace), LevelFilter::Trace));
    }
}
