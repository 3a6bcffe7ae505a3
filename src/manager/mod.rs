//! 连接管理器模块
//!
//! 持有进程内唯一的数据库连接，负责连接、断开、状态查询和句柄借出

mod global;
mod manager;

// 重新导出主要类型
pub use global::{get_connection_manager, init_connection_manager};
pub use manager::{ConnectionManager, ConnectionStatus};
