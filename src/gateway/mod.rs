//! CRUD门面模块
//!
//! 对任意集合提供插入、查询、更新、删除、计数以及连接管理操作

mod crud;
mod notifier;

pub use crud::{build_update_document, CrudGateway};
pub use notifier::{
    ChannelNotifier, ConnectivityEvent, ConnectivityNotifier, LogNotifier, CONNECTED_EVENT,
    DISCONNECTED_EVENT,
};
