//! cfx_mongodb - 游戏服务器脚本运行时内嵌的MongoDB访问门面
//!
//! 持有进程内唯一的数据库连接，通过导出函数表向其他脚本提供通用CRUD操作，
//! 所有结果统一为 `{success, ...}` / `{success: false, error}` 信封

// 导出所有公共模块
pub mod error;
pub mod i18n;
pub mod config;
pub mod logging;
pub mod types;
pub mod adapter;
pub mod manager;
pub mod gateway;
pub mod exports;
pub mod runtime;

// 重新导出常用类型和函数
pub use error::{GatewayError, GatewayResult, DOCUMENT_NOT_FOUND_MESSAGE, NOT_CONNECTED_MESSAGE};
pub use types::*;
pub use adapter::{
    create_adapter, AdapterKind, DatabaseAdapter, DatabaseHandle, FindOptions, MemoryAdapter,
    MongoAdapter, UpdateOutcome,
};
pub use config::{
    load_connection_config, ConnectionConfig, ConnectionConfigBuilder, ConnectionOptions,
    Environment, LogLevel, LoggingConfig, LoggingConfigBuilder,
};
pub use manager::{get_connection_manager, init_connection_manager, ConnectionManager, ConnectionStatus};
pub use gateway::{
    ChannelNotifier, ConnectivityEvent, ConnectivityNotifier, CrudGateway, LogNotifier,
};
pub use exports::{CallContext, ExportTable};
pub use runtime::ResourceHost;

// 条件编译调试宏 - 只有在 debug 模式下才输出调试信息
#[cfg(debug_assertions)]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        rat_logger::debug!($($arg)*);
    };
}

#[cfg(not(debug_assertions))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        // 在 release 模式下不输出调试信息
    };
}

/// 初始化cfx_mongodb库
///
/// 注册多语言错误消息并按环境变量选择语言
///
/// 注意：日志系统由调用者自行初始化，见 [`logging::init_logger`]
pub fn init() {
    i18n::ErrorMessageI18n::init();
}

/// 库版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 库名称
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// 获取库信息
pub fn get_info() -> String {
    format!("{} v{}", NAME, VERSION)
}
