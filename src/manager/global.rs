//! 进程内唯一的连接管理器实例

use crate::adapter::MongoAdapter;
use crate::config::{load_connection_config, EnvSource};
use crate::error::GatewayResult;
use once_cell::sync::OnceCell;
use std::sync::Arc;

use super::ConnectionManager;

static CONNECTION_MANAGER: OnceCell<Arc<ConnectionManager>> = OnceCell::new();

/// 获取全局连接管理器
///
/// 首次调用时从进程环境读取配置并使用MongoDB适配器创建，并发的首次调用只会构建一次
pub fn get_connection_manager() -> GatewayResult<Arc<ConnectionManager>> {
    CONNECTION_MANAGER
        .get_or_try_init(|| -> GatewayResult<Arc<ConnectionManager>> {
            let config = load_connection_config(&EnvSource)?;
            Ok(Arc::new(ConnectionManager::new(Arc::new(MongoAdapter::new()), config)))
        })
        .cloned()
}

/// 在首次使用前安装自定义的连接管理器
///
/// 已经初始化过时返回配置错误，原实例保持不变
pub fn init_connection_manager(manager: Arc<ConnectionManager>) -> GatewayResult<Arc<ConnectionManager>> {
    CONNECTION_MANAGER
        .set(manager.clone())
        .map_err(|_| crate::gateway_error!(config, "连接管理器已经初始化"))?;
    Ok(manager)
}
