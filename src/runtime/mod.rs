//! 资源生命周期绑定
//!
//! 运行时在资源启动/停止时回调这里：启动时用默认配置连接，首次连接成功后构建导出函数表；
//! 停止时断开连接。两个回调都只记录失败，不向运行时抛出

use crate::exports::ExportTable;
use crate::gateway::CrudGateway;
use crate::manager::{get_connection_manager, ConnectionManager};
use crate::error::GatewayResult;
use once_cell::sync::OnceCell;
use rat_logger::{error, info};
use std::sync::Arc;

/// 资源宿主
#[derive(Debug)]
pub struct ResourceHost {
    resource_name: String,
    gateway: Arc<CrudGateway>,
    exports: OnceCell<Arc<ExportTable>>,
}

impl ResourceHost {
    /// 使用指定的连接管理器创建
    pub fn new<S: Into<String>>(resource_name: S, manager: Arc<ConnectionManager>) -> Self {
        Self::with_gateway(resource_name, Arc::new(CrudGateway::new(manager)))
    }

    pub fn with_gateway<S: Into<String>>(resource_name: S, gateway: Arc<CrudGateway>) -> Self {
        Self {
            resource_name: resource_name.into(),
            gateway,
            exports: OnceCell::new(),
        }
    }

    /// 使用全局连接管理器创建，同时完成多语言初始化
    pub fn from_env<S: Into<String>>(resource_name: S) -> GatewayResult<Self> {
        crate::init();
        Ok(Self::new(resource_name, get_connection_manager()?))
    }

    pub fn resource_name(&self) -> &str {
        &self.resource_name
    }

    pub fn gateway(&self) -> &Arc<CrudGateway> {
        &self.gateway
    }

    /// 导出函数表，首次连接成功之前为None
    pub fn exports(&self) -> Option<Arc<ExportTable>> {
        self.exports.get().cloned()
    }

    /// 资源启动回调，返回是否处于已连接状态
    pub async fn on_resource_start(&self, name: &str) -> bool {
        if name != self.resource_name {
            return false;
        }

        match self.gateway.manager().connect(None).await {
            Ok(()) => {
                self.exports.get_or_init(|| {
                    let table = ExportTable::for_gateway(self.gateway.clone());
                    info!("[CFX-MongoDB] Exports registered ({} names)", table.len());
                    Arc::new(table)
                });
                info!("{} started and MongoDB connected", name);
                true
            }
            Err(e) => {
                error!("Failed to start {}: {}", name, e);
                false
            }
        }
    }

    /// 资源停止回调
    pub async fn on_resource_stop(&self, name: &str) {
        if name != self.resource_name {
            return;
        }

        match self.gateway.manager().disconnect().await {
            Ok(()) => info!("{} stopped and MongoDB disconnected", name),
            Err(e) => error!("Error while stopping {}: {}", name, e),
        }
    }
}
