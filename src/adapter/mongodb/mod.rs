//! MongoDB适配器模块
//!
//! - adapter.rs: 建立连接、选择默认数据库
//! - operations.rs: DatabaseHandle trait实现

pub mod adapter;
pub mod operations;

// 重新导出核心类型
pub use adapter::{MongoAdapter, MongoHandle};
